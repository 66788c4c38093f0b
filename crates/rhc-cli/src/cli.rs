use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use rhc_algo::BackendKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rolling-horizon unit commitment with tiered startup costs", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a scenario window by window and print the stitched schedule
    Schedule {
        /// Scenario file (TOML with [unit], [horizon], [initial] and [data])
        #[arg(long, value_hint = ValueHint::FilePath)]
        scenario: PathBuf,

        /// Solver backend (`dp` or `milp`); overrides the scenario's [solver] section
        #[arg(long)]
        backend: Option<BackendKind>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,

        /// Write the schedule to this file instead of stdout
        #[arg(long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },
    /// Check a scenario without solving it
    Validate {
        /// Scenario file
        #[arg(long, value_hint = ValueHint::FilePath)]
        scenario: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}
