//! Scenario files: one unit, its windowing, initial state and driving data.
//!
//! ```toml
//! [unit]
//! name = "chp"
//! capacity_min = 2.0
//! capacity_max = 10.0
//! ramp_up_limit = 5.0
//! ramp_down_limit = 5.0
//! min_uptime = 2
//! min_downtime = 1
//! startup_tiers = [
//!     { max_off_duration = 1, cost = 1.0 },
//!     { max_off_duration = 3, cost = 4.0 },
//!     { cost = 5.0 },
//! ]
//!
//! [horizon]
//! window_length = 3
//! look_ahead = 0
//! timeout_ms = 10000
//!
//! [initial]
//! status = "on"
//! consecutive_duration = 2
//! last_output = 2.0
//!
//! [data]
//! demand = [0.0, 4.0, 6.0, 8.0, 8.0, 5.0]
//!
//! [solver]
//! backend = "dp"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use rhc_algo::{
    BackendKind, CommitmentBackend, DynamicProgrammingBackend, HorizonPartitioner, RollingConfig,
    RollingHorizon,
};
use rhc_core::{DrivingData, StateCarrier, UnitSpec};
use serde::Deserialize;

fn default_resolution() -> f64 {
    1.0
}

/// Backend selection and tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverSection {
    /// `dp` or `milp`
    #[serde(default)]
    pub backend: Option<String>,
    /// Output grid spacing of the DP backend
    #[serde(default = "default_resolution")]
    pub dp_resolution: f64,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            backend: None,
            dp_resolution: default_resolution(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub unit: UnitSpec,
    pub horizon: RollingConfig,
    pub initial: StateCarrier,
    pub data: DrivingData,
    #[serde(default)]
    pub solver: SolverSection,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing scenario file: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Backend named by the scenario, unless overridden.
    pub fn backend_kind(&self, requested: Option<BackendKind>) -> Result<BackendKind> {
        if let Some(kind) = requested {
            return Ok(kind);
        }
        match &self.solver.backend {
            Some(name) => name.parse().map_err(|e: String| anyhow!(e)),
            None => Ok(BackendKind::default()),
        }
    }

    pub fn build_backend(&self, kind: BackendKind) -> Result<Box<dyn CommitmentBackend>> {
        match kind {
            BackendKind::DynamicProgramming => {
                let resolution = self.solver.dp_resolution;
                if !(resolution.is_finite() && resolution > 0.0) {
                    bail!("dp_resolution must be positive (got {resolution})");
                }
                Ok(Box::new(DynamicProgrammingBackend::new(resolution)))
            }
            BackendKind::Milp => kind
                .create()
                .ok_or_else(|| anyhow!("the MILP backend is not compiled into this build")),
        }
    }

    pub fn scheduler<'a>(&'a self, backend: &'a dyn CommitmentBackend) -> RollingHorizon<'a> {
        RollingHorizon::new(&self.unit, &self.data, self.horizon.clone(), backend)
    }

    /// Check everything a run would reject before its first solve.
    pub fn validate(&self) -> Result<HorizonPartitioner> {
        let backend = DynamicProgrammingBackend::default();
        let partitioner = self
            .scheduler(&backend)
            .validate(&self.initial)
            .context("scenario rejected")?;
        Ok(partitioner)
    }
}
