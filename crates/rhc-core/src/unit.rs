//! Static description of one dispatchable unit.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::startup::{self, StartupTier};

fn default_name() -> String {
    "unit".to_string()
}

fn default_dwell() -> u32 {
    1
}

/// Technical and economic parameters of a dispatchable unit.
///
/// Built once at configuration time and never mutated afterwards. Use
/// [`UnitSpec::builder`] or deserialize and call [`UnitSpec::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Label used in logs and output
    #[serde(default = "default_name")]
    pub name: String,
    /// Minimum output when online
    pub capacity_min: f64,
    /// Maximum output when online
    pub capacity_max: f64,
    /// Maximum output increase between consecutive online timesteps
    pub ramp_up_limit: f64,
    /// Maximum output decrease between consecutive online timesteps
    pub ramp_down_limit: f64,
    /// Minimum consecutive online timesteps after a startup (1 = unrestricted)
    #[serde(default = "default_dwell")]
    pub min_uptime: u32,
    /// Minimum consecutive offline timesteps after a shutdown (1 = unrestricted)
    #[serde(default = "default_dwell")]
    pub min_downtime: u32,
    /// Startup cost brackets, hot to cold
    pub startup_tiers: Vec<StartupTier>,
    /// Cost per unit of output per timestep
    #[serde(default)]
    pub variable_cost: f64,
    /// Cost charged on every on→off transition
    #[serde(default)]
    pub shutdown_cost: f64,
}

impl UnitSpec {
    /// Start building a unit spec
    pub fn builder() -> UnitSpecBuilder {
        UnitSpecBuilder::default()
    }

    /// Check every invariant of the unit description.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("capacity_min", self.capacity_min),
            ("capacity_max", self.capacity_max),
            ("ramp_up_limit", self.ramp_up_limit),
            ("ramp_down_limit", self.ramp_down_limit),
            ("variable_cost", self.variable_cost),
            ("shutdown_cost", self.shutdown_cost),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.capacity_min > self.capacity_max || self.capacity_max <= 0.0 {
            return Err(ConfigError::CapacityBounds {
                min: self.capacity_min,
                max: self.capacity_max,
            });
        }
        if self.min_uptime == 0 {
            return Err(ConfigError::ZeroDwell { field: "min_uptime" });
        }
        if self.min_downtime == 0 {
            return Err(ConfigError::ZeroDwell {
                field: "min_downtime",
            });
        }

        startup::validate_tiers(&self.startup_tiers)
    }

    /// Cost of a startup after `off_duration` steps offline.
    pub fn startup_cost(&self, off_duration: u32) -> f64 {
        startup::startup_cost(off_duration, &self.startup_tiers)
    }

    /// Highest output reachable in the first online step after a startup.
    pub fn startup_ramp(&self) -> f64 {
        self.ramp_up_limit.max(self.capacity_min)
    }

    /// Highest output from which the unit may shut down in the next step.
    pub fn shutdown_ramp(&self) -> f64 {
        self.ramp_down_limit.max(self.capacity_min)
    }

    /// Off-duration beyond which every startup costs the same (cold).
    pub fn cold_after(&self) -> u32 {
        startup::last_finite_bound(&self.startup_tiers)
    }

    /// Cheapest possible startup (hot tier).
    pub fn cheapest_startup(&self) -> f64 {
        self.startup_tiers.first().map_or(0.0, |tier| tier.cost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ramp {
    Absolute { up: f64, down: f64 },
    Relative { up: f64, down: f64 },
}

/// Builder for [`UnitSpec`].
///
/// Capacity and ramp limits can be given directly or relative to a nominal
/// rating; relative ramps are resolved against the nominal rating (or
/// `capacity_max` if no nominal rating was given) when [`build`](Self::build)
/// is called.
#[derive(Debug, Clone)]
pub struct UnitSpecBuilder {
    name: String,
    nominal: Option<f64>,
    capacity_min: f64,
    capacity_max: f64,
    ramp: Ramp,
    min_uptime: u32,
    min_downtime: u32,
    startup_tiers: Vec<StartupTier>,
    variable_cost: f64,
    shutdown_cost: f64,
}

impl Default for UnitSpecBuilder {
    fn default() -> Self {
        Self {
            name: default_name(),
            nominal: None,
            capacity_min: 0.0,
            capacity_max: 0.0,
            ramp: Ramp::Relative { up: 1.0, down: 1.0 },
            min_uptime: 1,
            min_downtime: 1,
            startup_tiers: vec![StartupTier::unbounded(0.0)],
            variable_cost: 0.0,
            shutdown_cost: 0.0,
        }
    }
}

impl UnitSpecBuilder {
    /// Set the unit label
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set absolute capacity bounds
    pub fn capacity(mut self, min: f64, max: f64) -> Self {
        self.capacity_min = min;
        self.capacity_max = max;
        self
    }

    /// Set capacity bounds as fractions of a nominal rating
    pub fn nominal(mut self, nominal: f64, min_fraction: f64, max_fraction: f64) -> Self {
        self.nominal = Some(nominal);
        self.capacity_min = nominal * min_fraction;
        self.capacity_max = nominal * max_fraction;
        self
    }

    /// Set absolute ramp limits
    pub fn ramp(mut self, up: f64, down: f64) -> Self {
        self.ramp = Ramp::Absolute { up, down };
        self
    }

    /// Set ramp limits as fractions of the nominal rating
    pub fn relative_ramp(mut self, up_fraction: f64, down_fraction: f64) -> Self {
        self.ramp = Ramp::Relative {
            up: up_fraction,
            down: down_fraction,
        };
        self
    }

    /// Set minimum up and down times (timesteps)
    pub fn min_up_down(mut self, min_uptime: u32, min_downtime: u32) -> Self {
        self.min_uptime = min_uptime;
        self.min_downtime = min_downtime;
        self
    }

    /// Replace the startup tiers
    pub fn startup_tiers(mut self, tiers: Vec<StartupTier>) -> Self {
        self.startup_tiers = tiers;
        self
    }

    /// Hot/warm/cold startup tiers
    pub fn hot_warm_cold(
        self,
        t_hot: u32,
        c_hot: f64,
        t_warm: u32,
        c_warm: f64,
        c_cold: f64,
    ) -> Self {
        self.startup_tiers(startup::hot_warm_cold(t_hot, c_hot, t_warm, c_warm, c_cold))
    }

    /// Set the variable cost per unit of output
    pub fn variable_cost(mut self, cost: f64) -> Self {
        self.variable_cost = cost;
        self
    }

    /// Set the cost charged per shutdown
    pub fn shutdown_cost(mut self, cost: f64) -> Self {
        self.shutdown_cost = cost;
        self
    }

    /// Resolve relative parameters and validate the result.
    pub fn build(self) -> Result<UnitSpec, ConfigError> {
        let (ramp_up_limit, ramp_down_limit) = match self.ramp {
            Ramp::Absolute { up, down } => (up, down),
            Ramp::Relative { up, down } => {
                let rating = self.nominal.unwrap_or(self.capacity_max);
                (rating * up, rating * down)
            }
        };

        let spec = UnitSpec {
            name: self.name,
            capacity_min: self.capacity_min,
            capacity_max: self.capacity_max,
            ramp_up_limit,
            ramp_down_limit,
            min_uptime: self.min_uptime,
            min_downtime: self.min_downtime,
            startup_tiers: self.startup_tiers,
            variable_cost: self.variable_cost,
            shutdown_cost: self.shutdown_cost,
        };
        spec.validate()?;
        Ok(spec)
    }
}
