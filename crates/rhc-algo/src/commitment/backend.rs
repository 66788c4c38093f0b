//! Solver capability used by the window adapter.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rhc_core::UnitStatus;
use thiserror::Error;

use super::CommitmentFormulation;

/// Per-step status and output for every step of a window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pub status: Vec<UnitStatus>,
    pub output: Vec<f64>,
}

impl Assignment {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            status: Vec::with_capacity(n),
            output: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, status: UnitStatus, output: f64) {
        self.status.push(status);
        self.output.push(if status.is_on() { output } else { 0.0 });
    }

    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }
}

/// Why a backend returned no assignment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveFailure {
    #[error("infeasible: {0}")]
    Infeasible(String),

    #[error("time limit exceeded after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("solver error: {0}")]
    Failed(String),
}

/// Solves one window's commitment problem.
///
/// Implementations must honour every constraint of the formulation; the
/// adapter re-checks the returned assignment and reports violations as
/// solver failures.
pub trait CommitmentBackend: Send + Sync {
    /// Unique identifier (e.g., "dp", "milp")
    fn id(&self) -> &str;

    /// Solve the window within `timeout`
    fn solve(
        &self,
        formulation: &CommitmentFormulation<'_>,
        timeout: Duration,
    ) -> Result<Assignment, SolveFailure>;
}

/// Selectable backend implementations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Exact dynamic program over an output grid
    #[default]
    DynamicProgramming,
    /// Mixed-integer model solved through good_lp
    Milp,
}

impl BackendKind {
    /// Instantiate the backend with default settings.
    ///
    /// Returns `None` for [`BackendKind::Milp`] when no MILP solver feature
    /// is compiled in.
    pub fn create(self) -> Option<Box<dyn CommitmentBackend>> {
        match self {
            BackendKind::DynamicProgramming => {
                Some(Box::new(super::DynamicProgrammingBackend::default()))
            }
            #[cfg(any(feature = "solver-microlp", feature = "solver-highs"))]
            BackendKind::Milp => Some(Box::new(super::MilpBackend::default())),
            #[cfg(not(any(feature = "solver-microlp", feature = "solver-highs")))]
            BackendKind::Milp => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::DynamicProgramming => write!(f, "dp"),
            BackendKind::Milp => write!(f, "milp"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dp" | "dynamic-programming" => Ok(BackendKind::DynamicProgramming),
            "milp" | "mip" => Ok(BackendKind::Milp),
            other => Err(format!("unknown backend `{other}` (expected `dp` or `milp`)")),
        }
    }
}
