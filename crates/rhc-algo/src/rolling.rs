//! # Rolling-Horizon Orchestration
//!
//! Drives the partitioner, solves each window from the carried state, keeps
//! only the authoritative steps and advances the carrier between windows.
//!
//! ```text
//!            ┌─────────┐  next window   ┌─────────┐  segment   ┌───────────┐
//!  start ──▶ │ Pending │ ─────────────▶ │ Solving │ ─────────▶ │ Advancing │
//!            └─────────┘                └─────────┘            └───────────┘
//!                 │ ▲                        │                       │
//!      exhausted  │ └────────────────────────┼───────────────────────┘
//!                 ▼                          ▼ infeasible / timeout / error
//!            ┌─────────┐                ┌─────────┐
//!            │  Done   │                │ Failed  │
//!            └─────────┘                └─────────┘
//! ```
//!
//! Windows are solved strictly one after another: each formulation needs the
//! state left by the previous one. Nothing is retried or relaxed after a
//! failure; the caller gets the partial schedule and the error.

use std::fmt;
use std::time::Duration;

use rhc_core::{DrivingData, FullSchedule, ScheduleError, StateCarrier, UnitSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commitment::{CommitmentBackend, WindowSolverAdapter};
use crate::horizon::HorizonPartitioner;

fn default_timeout_ms() -> u64 {
    60_000
}

/// Windowing and time-budget parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingConfig {
    /// Steps per window, look-ahead included
    pub window_length: usize,
    /// Trailing steps of each window that are solved but discarded
    #[serde(default)]
    pub look_ahead: usize,
    /// Solver time budget per window (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Steps to schedule; defaults to the length of the driving data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon: Option<usize>,
}

impl RollingConfig {
    pub fn new(window_length: usize, look_ahead: usize) -> Self {
        Self {
            window_length,
            look_ahead,
            timeout_ms: default_timeout_ms(),
            horizon: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = Some(horizon);
        self
    }

    pub fn solver_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Pending,
    Solving,
    Advancing,
    Done,
    Failed,
}

impl Phase {
    /// Whether the orchestrator may move from `self` to `next`.
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Pending, Phase::Solving | Phase::Done | Phase::Failed)
                | (Phase::Solving, Phase::Advancing | Phase::Failed)
                | (Phase::Advancing, Phase::Pending | Phase::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pending => "pending",
            Phase::Solving => "solving",
            Phase::Advancing => "advancing",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Per-window diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub index: usize,
    pub start: usize,
    pub authoritative_end: usize,
    pub end: usize,
    /// Objective of the full window, look-ahead included
    pub objective: f64,
    pub elapsed: Duration,
}

/// Result of a rolling-horizon run.
#[derive(Debug, Clone)]
pub enum RollingOutcome {
    /// Every window solved; the schedule covers the whole horizon.
    Done {
        schedule: FullSchedule,
        carrier: StateCarrier,
        windows: Vec<WindowReport>,
    },
    /// A window (or the configuration) failed. `partial` holds every window
    /// solved before the failure; `carrier` is the state entering the
    /// failed window.
    Failed {
        partial: FullSchedule,
        carrier: StateCarrier,
        windows: Vec<WindowReport>,
        error: ScheduleError,
    },
}

impl RollingOutcome {
    pub fn phase(&self) -> Phase {
        match self {
            RollingOutcome::Done { .. } => Phase::Done,
            RollingOutcome::Failed { .. } => Phase::Failed,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, RollingOutcome::Done { .. })
    }

    /// The full or partial schedule.
    pub fn schedule(&self) -> &FullSchedule {
        match self {
            RollingOutcome::Done { schedule, .. } => schedule,
            RollingOutcome::Failed { partial, .. } => partial,
        }
    }

    pub fn carrier(&self) -> &StateCarrier {
        match self {
            RollingOutcome::Done { carrier, .. } | RollingOutcome::Failed { carrier, .. } => {
                carrier
            }
        }
    }

    pub fn windows(&self) -> &[WindowReport] {
        match self {
            RollingOutcome::Done { windows, .. } | RollingOutcome::Failed { windows, .. } => {
                windows
            }
        }
    }

    pub fn error(&self) -> Option<&ScheduleError> {
        match self {
            RollingOutcome::Done { .. } => None,
            RollingOutcome::Failed { error, .. } => Some(error),
        }
    }

    /// Discard the partial schedule of a failed run.
    pub fn into_result(self) -> Result<FullSchedule, ScheduleError> {
        match self {
            RollingOutcome::Done { schedule, .. } => Ok(schedule),
            RollingOutcome::Failed { error, .. } => Err(error),
        }
    }
}

/// Rolling-horizon scheduler for one unit.
pub struct RollingHorizon<'a> {
    unit: &'a UnitSpec,
    data: &'a DrivingData,
    config: RollingConfig,
    backend: &'a dyn CommitmentBackend,
}

impl<'a> RollingHorizon<'a> {
    pub fn new(
        unit: &'a UnitSpec,
        data: &'a DrivingData,
        config: RollingConfig,
        backend: &'a dyn CommitmentBackend,
    ) -> Self {
        Self {
            unit,
            data,
            config,
            backend,
        }
    }

    pub fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Number of timesteps this run schedules.
    pub fn horizon(&self) -> usize {
        self.config.horizon.unwrap_or_else(|| self.data.len())
    }

    /// Check unit, windowing, initial state and data coverage without
    /// solving anything.
    pub fn validate(&self, initial: &StateCarrier) -> Result<HorizonPartitioner, ScheduleError> {
        self.unit.validate()?;
        let partitioner = HorizonPartitioner::new(
            self.horizon(),
            self.config.window_length,
            self.config.look_ahead,
        )?;
        initial.validate_against(self.unit)?;
        self.data.check_coverage(self.horizon())?;
        Ok(partitioner)
    }

    /// Solve every window in order, starting from `initial`.
    pub fn run(&self, initial: StateCarrier) -> RollingOutcome {
        let mut schedule = FullSchedule::new();
        let mut windows = Vec::new();

        let partitioner = match self.validate(&initial) {
            Ok(partitioner) => partitioner,
            Err(error) => {
                warn!(unit = %self.unit.name, %error, "configuration rejected before solving");
                transition(Phase::Pending, Phase::Failed, None);
                return RollingOutcome::Failed {
                    partial: schedule,
                    carrier: initial,
                    windows,
                    error,
                };
            }
        };

        info!(
            unit = %self.unit.name,
            backend = self.backend.id(),
            horizon = self.horizon(),
            windows = partitioner.len(),
            period = partitioner.period(),
            look_ahead = self.config.look_ahead,
            "starting rolling horizon"
        );

        let adapter = WindowSolverAdapter::new(self.unit, self.backend, self.config.solver_timeout());
        let mut carrier = initial;

        for span in partitioner {
            transition(Phase::Pending, Phase::Solving, Some(span.index));
            debug!(
                window = span.index,
                start = span.start,
                authoritative_end = span.authoritative_end,
                end = span.end,
                carried = %carrier,
                "solving window"
            );

            let solved = span
                .with_data(self.data)
                .map_err(ScheduleError::from)
                .and_then(|window| adapter.solve(&window, &carrier));
            let solution = match solved {
                Ok(solution) => solution,
                Err(error) => {
                    warn!(window = span.index, %error, "window failed, returning partial schedule");
                    transition(Phase::Solving, Phase::Failed, Some(span.index));
                    return RollingOutcome::Failed {
                        partial: schedule,
                        carrier,
                        windows,
                        error,
                    };
                }
            };

            transition(Phase::Solving, Phase::Advancing, Some(span.index));
            let next = carrier.advance(&solution.segment);
            if let Err(error) = schedule.append(solution.segment) {
                transition(Phase::Advancing, Phase::Failed, Some(span.index));
                return RollingOutcome::Failed {
                    partial: schedule,
                    carrier,
                    windows,
                    error,
                };
            }
            carrier = next;
            windows.push(WindowReport {
                index: span.index,
                start: span.start,
                authoritative_end: span.authoritative_end,
                end: span.end,
                objective: solution.objective,
                elapsed: solution.elapsed,
            });
            transition(Phase::Advancing, Phase::Pending, Some(span.index));
        }

        if let Err(error) = schedule.verify_complete(self.horizon()) {
            transition(Phase::Pending, Phase::Failed, None);
            return RollingOutcome::Failed {
                partial: schedule,
                carrier,
                windows,
                error,
            };
        }

        transition(Phase::Pending, Phase::Done, None);
        let totals = schedule.totals();
        info!(
            unit = %self.unit.name,
            startups = totals.startups,
            startup_cost = totals.startup,
            total_cost = totals.total(),
            "rolling horizon complete"
        );
        RollingOutcome::Done {
            schedule,
            carrier,
            windows,
        }
    }
}

fn transition(from: Phase, to: Phase, window: Option<usize>) {
    debug_assert!(from.can_advance_to(to), "illegal phase transition {from} -> {to}");
    debug!(%from, %to, window, "phase transition");
}
