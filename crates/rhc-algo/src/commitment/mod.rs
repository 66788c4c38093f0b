//! Single-window unit commitment.
//!
//! The architecture separates what is solved from how it is solved:
//!
//! - **[`CommitmentFormulation`]**: one window's problem, including the seam
//!   conditions carried from the previous window, plus the checker and cost
//!   function every backend is held to
//! - **[`CommitmentBackend`]**: a solver capability (`solve(formulation,
//!   timeout)`); [`DynamicProgrammingBackend`] and [`MilpBackend`] ship here
//! - **[`WindowSolverAdapter`]**: builds the formulation, calls the backend,
//!   validates the answer and prices the authoritative steps

mod adapter;
mod backend;
mod dp;
mod formulation;
#[cfg(any(feature = "solver-microlp", feature = "solver-highs"))]
mod milp;

pub use adapter::{WindowSolution, WindowSolverAdapter};
pub use backend::{Assignment, BackendKind, CommitmentBackend, SolveFailure};
pub use dp::DynamicProgrammingBackend;
pub use formulation::CommitmentFormulation;
#[cfg(any(feature = "solver-microlp", feature = "solver-highs"))]
pub use milp::MilpBackend;
