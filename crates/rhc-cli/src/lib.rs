//! Command-line front end: scenario files in, stitched schedules out.

pub mod cli;
pub mod commands;
pub mod scenario;

pub use cli::{Cli, Commands, OutputFormat};
pub use scenario::{Scenario, SolverSection};
