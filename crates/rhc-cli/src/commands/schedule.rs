use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rhc_algo::{BackendKind, RollingOutcome, WindowReport};
use rhc_core::startup::tier_label;
use rhc_core::{CostTotals, FullSchedule, ScheduleEntry, StateCarrier};
use serde::Serialize;
use tabwriter::TabWriter;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::scenario::Scenario;

#[derive(Serialize)]
struct WindowJson {
    index: usize,
    start: usize,
    authoritative_end: usize,
    end: usize,
    objective: f64,
    elapsed_ms: f64,
}

impl From<&WindowReport> for WindowJson {
    fn from(report: &WindowReport) -> Self {
        Self {
            index: report.index,
            start: report.start,
            authoritative_end: report.authoritative_end,
            end: report.end,
            objective: report.objective,
            elapsed_ms: report.elapsed.as_secs_f64() * 1e3,
        }
    }
}

#[derive(Serialize)]
struct ScheduleJson<'a> {
    status: String,
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    totals: CostTotals,
    carrier: &'a StateCarrier,
    windows: Vec<WindowJson>,
    entries: &'a [ScheduleEntry],
}

pub fn handle(
    scenario_path: &Path,
    backend: Option<BackendKind>,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let kind = scenario.backend_kind(backend)?;
    let solver = scenario.build_backend(kind)?;
    info!(
        "Scheduling {} over {} timesteps with the {} backend",
        scenario.unit.name,
        scenario.scheduler(solver.as_ref()).horizon(),
        kind
    );

    let outcome = scenario.scheduler(solver.as_ref()).run(scenario.initial.clone());

    let mut sink: Box<dyn Write> = match out {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("creating output file: {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    match format {
        OutputFormat::Plain => write_plain(&mut sink, &scenario, &outcome)?,
        OutputFormat::Json => write_json(&mut sink, kind, &outcome)?,
    }
    sink.flush()?;
    if let Some(path) = out {
        info!("Schedule written to {}", path.display());
    }

    match outcome.error() {
        None => Ok(()),
        Some(err) => {
            warn!(
                "Stopped after {} of the horizon's timesteps; carried state: {}",
                outcome.schedule().len(),
                outcome.carrier()
            );
            Err(anyhow!("{err}"))
        }
    }
}

fn write_plain(sink: &mut dyn Write, scenario: &Scenario, outcome: &RollingOutcome) -> Result<()> {
    let schedule = outcome.schedule();
    write_entries(sink, schedule, scenario.unit.startup_tiers.len())?;
    writeln!(sink)?;
    writeln!(sink, "{}", schedule.summary())?;
    writeln!(sink, "Windows solved: {}", outcome.windows().len())?;
    writeln!(sink, "Final state: {}", outcome.carrier())?;
    writeln!(sink, "Status: {}", outcome.phase())?;
    if let Some(err) = outcome.error() {
        writeln!(sink, "Error: {err}")?;
    }
    Ok(())
}

fn write_entries(sink: &mut dyn Write, schedule: &FullSchedule, tier_count: usize) -> Result<()> {
    let mut writer = TabWriter::new(Vec::new()).padding(2);
    writeln!(
        writer,
        "T\tSTATUS\tOUTPUT\tSTARTUP\tTIER\tSHUTDOWN\tOPERATING\tRESIDUAL"
    )?;
    for entry in &schedule.entries {
        let tier = entry
            .startup_tier
            .map(|i| tier_label(i, tier_count))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            writer,
            "{}\t{}\t{:.3}\t{:.2}\t{}\t{:.2}\t{:.2}\t{:.3}",
            entry.timestep,
            entry.status,
            entry.output,
            entry.startup_cost,
            tier,
            entry.shutdown_cost,
            entry.operating_cost,
            entry.residual
        )?;
    }
    writer.flush()?;
    let table = writer
        .into_inner()
        .map_err(|err| anyhow!("formatting schedule table: {err}"))?;
    sink.write_all(&table)?;
    Ok(())
}

fn write_json(sink: &mut dyn Write, kind: BackendKind, outcome: &RollingOutcome) -> Result<()> {
    let schedule = outcome.schedule();
    let payload = ScheduleJson {
        status: outcome.phase().to_string(),
        backend: kind.to_string(),
        error: outcome.error().map(|e| e.to_string()),
        totals: schedule.totals(),
        carrier: outcome.carrier(),
        windows: outcome.windows().iter().map(WindowJson::from).collect(),
        entries: &schedule.entries,
    };
    serde_json::to_writer_pretty(&mut *sink, &payload).context("serializing schedule")?;
    writeln!(sink)?;
    Ok(())
}
