use std::process::ExitCode;

use clap::Parser;
use rhc_cli::commands::{schedule, validate};
use rhc_cli::{Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
        return ExitCode::FAILURE;
    }

    let (name, result) = match &cli.command {
        Commands::Schedule {
            scenario,
            backend,
            format,
            out,
        } => (
            "schedule",
            schedule::handle(scenario, *backend, *format, out.as_deref()),
        ),
        Commands::Validate { scenario } => ("validate", validate::handle(scenario)),
    };

    match result {
        Ok(()) => {
            info!("{name} finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{name} failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
