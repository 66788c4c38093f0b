//! Error taxonomy for rolling-horizon scheduling.
//!
//! Errors are split by the stage that detects them:
//!
//! - [`ConfigError`]: bad unit, window or initial-state parameters. Detected
//!   before any solve.
//! - [`DataAlignmentError`]: driving data that does not cover a timestep or
//!   carries an unusable value there.
//! - [`ScheduleError`]: everything the orchestrator can surface to its caller,
//!   including per-window solver outcomes. Window failures carry the window
//!   index and the state carried into that window for diagnostics.

use std::ops::Range;
use std::time::Duration;

use thiserror::Error;

use crate::carrier::StateCarrier;

/// Invalid configuration, rejected before the first window is solved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric unit parameter is NaN or infinite.
    #[error("unit parameter `{field}` must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },

    /// A unit parameter that must be non-negative is negative.
    #[error("unit parameter `{field}` must be non-negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    /// `capacity_min > capacity_max` or an empty capacity range.
    #[error("invalid capacity bounds: min {min} must be <= max {max} and max must be positive")]
    CapacityBounds { min: f64, max: f64 },

    /// Minimum up or down time of zero.
    #[error("`{field}` must be at least 1 timestep")]
    ZeroDwell { field: &'static str },

    /// No startup tiers given.
    #[error("at least one startup tier is required")]
    NoStartupTiers,

    /// Tier bounds are not strictly increasing.
    #[error("startup tier {index} bound {bound} does not exceed the previous bound {previous}")]
    TierOrder { index: usize, bound: u32, previous: u32 },

    /// A tier other than the last one is unbounded.
    #[error("startup tier {index} is unbounded but is not the last tier")]
    UnboundedTierNotLast { index: usize },

    /// The last tier has a finite bound, leaving long outages uncovered.
    #[error("the last startup tier must be unbounded (got bound {bound})")]
    LastTierBounded { bound: u32 },

    /// Tier costs must not decrease from hot to cold.
    #[error("startup tier {index} cost {cost} is below the previous tier cost {previous}")]
    TierCostDecreasing { index: usize, cost: f64, previous: f64 },

    /// Window length of zero.
    #[error("window length must be positive")]
    ZeroWindowLength,

    /// Look-ahead would leave no authoritative timesteps.
    #[error("look-ahead {look_ahead} must be smaller than the window length {window_length}")]
    LookAheadTooLong { look_ahead: usize, window_length: usize },

    /// Horizon of zero timesteps.
    #[error("the scheduling horizon must contain at least one timestep")]
    EmptyHorizon,

    /// Initial state inconsistent with its own invariants or with the unit.
    #[error("invalid initial state: {0}")]
    InitialState(String),
}

/// Driving data that does not line up with the horizon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataAlignmentError {
    /// The series ends before the requested timestep.
    #[error("series `{series}` has no value at timestep {timestep} (length {length})")]
    Missing {
        series: &'static str,
        timestep: usize,
        length: usize,
    },

    /// The value at a timestep is NaN, infinite or negative.
    #[error("series `{series}` has an invalid value {value} at timestep {timestep}")]
    InvalidValue {
        series: &'static str,
        timestep: usize,
        value: f64,
    },

    /// The residual supply price is unusable.
    #[error("residual supply cost must be finite and non-negative (got {0})")]
    ResidualCost(f64),
}

/// Everything the rolling-horizon orchestrator reports to its caller.
#[derive(Debug, Clone, Error)]
pub enum ScheduleError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("data alignment error: {0}")]
    DataAlignment(#[from] DataAlignmentError),

    /// A window has no feasible commitment.
    #[error("window {window} (timesteps {span:?}) is infeasible: {reason}")]
    WindowInfeasible {
        window: usize,
        span: Range<usize>,
        carried: StateCarrier,
        reason: String,
    },

    /// The solver exceeded its time budget for a window.
    #[error("window {window} (timesteps {span:?}) timed out after {elapsed:?} (limit {limit:?})")]
    TimedOut {
        window: usize,
        span: Range<usize>,
        carried: StateCarrier,
        elapsed: Duration,
        limit: Duration,
    },

    /// The solver failed for a reason other than infeasibility or time,
    /// or returned an assignment that violates the formulation.
    #[error("solver failed on window {window} (timesteps {span:?}): {message}")]
    SolverFailed {
        window: usize,
        span: Range<usize>,
        carried: StateCarrier,
        message: String,
    },

    /// The stitched schedule has a gap or an overlap.
    #[error("schedule integrity violated: {0}")]
    Integrity(String),
}

impl ScheduleError {
    /// Index of the window this error belongs to, if it is a window failure.
    pub fn window(&self) -> Option<usize> {
        match self {
            ScheduleError::WindowInfeasible { window, .. }
            | ScheduleError::TimedOut { window, .. }
            | ScheduleError::SolverFailed { window, .. } => Some(*window),
            _ => None,
        }
    }

    /// State carried into the failing window, if it is a window failure.
    pub fn carried_state(&self) -> Option<&StateCarrier> {
        match self {
            ScheduleError::WindowInfeasible { carried, .. }
            | ScheduleError::TimedOut { carried, .. }
            | ScheduleError::SolverFailed { carried, .. } => Some(carried),
            _ => None,
        }
    }

    /// Whether the error was raised before any window was solved.
    pub fn is_fatal_before_start(&self) -> bool {
        matches!(
            self,
            ScheduleError::Configuration(_) | ScheduleError::DataAlignment(_)
        )
    }
}

/// Convenience alias for results carrying a [`ScheduleError`].
pub type ScheduleResult<T> = Result<T, ScheduleError>;
