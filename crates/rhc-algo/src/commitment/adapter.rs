//! Window solver adapter: formulation in, authoritative segment out.

use std::time::Duration;

use rhc_core::{
    startup, ScheduleEntry, ScheduleError, ScheduleSegment, StateCarrier, UnitSpec, UnitStatus,
};
use tracing::{debug, warn};
use web_time::Instant;

use super::{Assignment, CommitmentBackend, CommitmentFormulation, SolveFailure};
use crate::horizon::Window;

/// Outcome of one successfully solved window.
#[derive(Debug, Clone)]
pub struct WindowSolution {
    /// Authoritative portion, priced
    pub segment: ScheduleSegment,
    /// Full assignment, look-ahead included
    pub assignment: Assignment,
    /// Objective of the full assignment
    pub objective: f64,
    pub elapsed: Duration,
}

/// Builds a window's formulation, delegates it to a backend and turns the
/// answer into a priced schedule segment.
pub struct WindowSolverAdapter<'a> {
    unit: &'a UnitSpec,
    backend: &'a dyn CommitmentBackend,
    timeout: Duration,
}

impl<'a> WindowSolverAdapter<'a> {
    pub fn new(unit: &'a UnitSpec, backend: &'a dyn CommitmentBackend, timeout: Duration) -> Self {
        Self {
            unit,
            backend,
            timeout,
        }
    }

    pub fn backend_id(&self) -> &str {
        self.backend.id()
    }

    /// Solve `window` starting from the read-only `carried` state.
    pub fn solve(
        &self,
        window: &Window<'_>,
        carried: &StateCarrier,
    ) -> Result<WindowSolution, ScheduleError> {
        let span = window.span;
        let formulation = CommitmentFormulation::new(
            span.index,
            self.unit,
            window.data,
            carried,
            span.authoritative_len(),
        );

        let started = Instant::now();
        let result = self.backend.solve(&formulation, self.timeout);
        let elapsed = started.elapsed();

        let assignment = match result {
            Ok(assignment) => assignment,
            Err(SolveFailure::Infeasible(reason)) => {
                return Err(ScheduleError::WindowInfeasible {
                    window: span.index,
                    span: span.full(),
                    carried: carried.clone(),
                    reason,
                })
            }
            Err(SolveFailure::TimedOut { elapsed }) => {
                return Err(ScheduleError::TimedOut {
                    window: span.index,
                    span: span.full(),
                    carried: carried.clone(),
                    elapsed,
                    limit: self.timeout,
                })
            }
            Err(SolveFailure::Failed(message)) => {
                return Err(ScheduleError::SolverFailed {
                    window: span.index,
                    span: span.full(),
                    carried: carried.clone(),
                    message,
                })
            }
        };

        if let Err(violation) = formulation.check(&assignment) {
            warn!(
                window = span.index,
                backend = self.backend.id(),
                %violation,
                "backend returned an assignment that violates the window constraints"
            );
            return Err(ScheduleError::SolverFailed {
                window: span.index,
                span: span.full(),
                carried: carried.clone(),
                message: format!("invalid assignment from `{}`: {violation}", self.backend.id()),
            });
        }

        let objective = formulation.objective(&assignment);
        let segment = extract_segment(&formulation, &assignment);
        debug!(
            window = span.index,
            objective,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "window solved"
        );

        Ok(WindowSolution {
            segment,
            assignment,
            objective,
            elapsed,
        })
    }
}

/// Price the authoritative steps of `assignment`, walking forward from the
/// carried state so that off-durations span the seam.
fn extract_segment(f: &CommitmentFormulation<'_>, assignment: &Assignment) -> ScheduleSegment {
    let unit = f.unit;
    let mut state = f.initial.clone();
    let mut entries = Vec::with_capacity(f.authoritative_len);

    for t in 0..f.authoritative_len.min(assignment.len()) {
        let status = assignment.status[t];
        let output = if status.is_on() {
            assignment.output[t]
        } else {
            0.0
        };
        let mut entry = ScheduleEntry::new(f.timestep(t), status, output);

        match (state.status, status) {
            (UnitStatus::Off, UnitStatus::On) => {
                let off_duration = state.consecutive_duration;
                entry.startup_cost = startup::startup_cost(off_duration, &unit.startup_tiers);
                entry.startup_tier = startup::classify(off_duration, &unit.startup_tiers);
            }
            (UnitStatus::On, UnitStatus::Off) => {
                entry.shutdown = true;
                entry.shutdown_cost = unit.shutdown_cost;
            }
            _ => {}
        }
        entry.operating_cost = f.operating_cost(t, output);
        if f.residual_cost().is_some() {
            entry.residual = (f.demand(t) - output).max(0.0);
        }

        state = state.step(status, output);
        entries.push(entry);
    }

    ScheduleSegment::new(entries)
}
