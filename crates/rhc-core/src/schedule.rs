//! Per-window and stitched schedules.

use serde::{Deserialize, Serialize};

use crate::carrier::UnitStatus;
use crate::error::ScheduleError;

/// Commitment decision and cost breakdown for one timestep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Horizon timestep
    pub timestep: usize,
    pub status: UnitStatus,
    /// Unit output (zero when off)
    pub output: f64,
    /// Startup cost charged at this step (non-zero only on an off→on transition)
    pub startup_cost: f64,
    /// Index of the startup tier that was charged, if the unit started here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_tier: Option<usize>,
    /// Whether the unit shut down at this step (on→off transition)
    #[serde(default)]
    pub shutdown: bool,
    /// Shutdown cost charged at this step
    #[serde(default)]
    pub shutdown_cost: f64,
    /// Variable cost of the unit's output plus the residual supply cost
    #[serde(default)]
    pub operating_cost: f64,
    /// Demand served by the residual supplier
    #[serde(default)]
    pub residual: f64,
}

impl ScheduleEntry {
    /// Entry with no costs attached.
    pub fn new(timestep: usize, status: UnitStatus, output: f64) -> Self {
        Self {
            timestep,
            status,
            output,
            startup_cost: 0.0,
            startup_tier: None,
            shutdown: false,
            shutdown_cost: 0.0,
            operating_cost: 0.0,
            residual: 0.0,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.startup_cost + self.shutdown_cost + self.operating_cost
    }

    pub fn is_startup(&self) -> bool {
        self.startup_tier.is_some()
    }
}

/// Aggregated costs over a run of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    pub startup: f64,
    pub shutdown: f64,
    pub operating: f64,
    pub startups: usize,
    pub shutdowns: usize,
    pub residual: f64,
}

impl CostTotals {
    fn from_entries<'a>(entries: impl IntoIterator<Item = &'a ScheduleEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut acc, e| {
            acc.startup += e.startup_cost;
            acc.shutdown += e.shutdown_cost;
            acc.operating += e.operating_cost;
            acc.residual += e.residual;
            if e.is_startup() {
                acc.startups += 1;
            }
            if e.shutdown {
                acc.shutdowns += 1;
            }
            acc
        })
    }

    pub fn total(&self) -> f64 {
        self.startup + self.shutdown + self.operating
    }
}

/// Authoritative portion of one solved window, in timestep order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSegment {
    pub entries: Vec<ScheduleEntry>,
}

impl ScheduleSegment {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_timestep(&self) -> Option<usize> {
        self.entries.first().map(|e| e.timestep)
    }

    pub fn last(&self) -> Option<&ScheduleEntry> {
        self.entries.last()
    }

    pub fn totals(&self) -> CostTotals {
        CostTotals::from_entries(&self.entries)
    }
}

/// Concatenation of authoritative segments covering the horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullSchedule {
    pub entries: Vec<ScheduleEntry>,
}

impl FullSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestep the next appended segment has to start at.
    pub fn next_timestep(&self) -> usize {
        self.entries.last().map_or(0, |e| e.timestep + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a segment; it must continue exactly where the schedule ends and
    /// be contiguous itself.
    pub fn append(&mut self, segment: ScheduleSegment) -> Result<(), ScheduleError> {
        let mut expected = self.next_timestep();
        for entry in &segment.entries {
            if entry.timestep != expected {
                return Err(ScheduleError::Integrity(format!(
                    "expected timestep {expected}, segment provides {}",
                    entry.timestep
                )));
            }
            expected += 1;
        }
        self.entries.extend(segment.entries);
        Ok(())
    }

    /// Check that every timestep of `[0, horizon)` appears exactly once, in order.
    pub fn verify_complete(&self, horizon: usize) -> Result<(), ScheduleError> {
        if self.entries.len() != horizon {
            return Err(ScheduleError::Integrity(format!(
                "schedule has {} entries for a horizon of {horizon}",
                self.entries.len()
            )));
        }
        for (expected, entry) in self.entries.iter().enumerate() {
            if entry.timestep != expected {
                return Err(ScheduleError::Integrity(format!(
                    "entry {expected} carries timestep {}",
                    entry.timestep
                )));
            }
        }
        Ok(())
    }

    pub fn totals(&self) -> CostTotals {
        CostTotals::from_entries(&self.entries)
    }

    pub fn total_startup_cost(&self) -> f64 {
        self.totals().startup
    }

    pub fn startup_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_startup()).count()
    }

    pub fn statuses(&self) -> Vec<UnitStatus> {
        self.entries.iter().map(|e| e.status).collect()
    }

    pub fn outputs(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.output).collect()
    }

    /// One-paragraph summary for logs and the CLI.
    pub fn summary(&self) -> String {
        let totals = self.totals();
        let online = self.entries.iter().filter(|e| e.status.is_on()).count();
        format!(
            "Schedule: {} timesteps, {} online\n\
             Startups: {} (cost {:.2})\n\
             Shutdowns: {} (cost {:.2})\n\
             Operating cost: {:.2} (residual supply {:.2})\n\
             Total cost: {:.2}",
            self.entries.len(),
            online,
            totals.startups,
            totals.startup,
            totals.shutdowns,
            totals.shutdown,
            totals.operating,
            totals.residual,
            totals.total()
        )
    }
}
