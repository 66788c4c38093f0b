//! Commitment state carried from one window to the next.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::ScheduleSegment;
use crate::unit::UnitSpec;
use crate::FEASIBILITY_TOL;

/// Online/offline status of a unit at one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Off,
    On,
}

impl UnitStatus {
    pub fn is_on(self) -> bool {
        matches!(self, UnitStatus::On)
    }

    pub fn from_on(on: bool) -> Self {
        if on {
            UnitStatus::On
        } else {
            UnitStatus::Off
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Off => write!(f, "off"),
            UnitStatus::On => write!(f, "on"),
        }
    }
}

/// State at the end of the last authoritative timestep of a window.
///
/// `consecutive_duration` counts how many timesteps the unit has held
/// `status`, including the last one; it is never zero. `last_output` is zero
/// whenever the unit is off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateCarrier {
    pub status: UnitStatus,
    pub consecutive_duration: u32,
    #[serde(default)]
    pub last_output: f64,
}

impl StateCarrier {
    /// Unit online for `duration` steps, producing `output` in the last one.
    pub fn online(duration: u32, output: f64) -> Self {
        Self {
            status: UnitStatus::On,
            consecutive_duration: duration,
            last_output: output,
        }
    }

    /// Unit offline for `duration` steps.
    pub fn offline(duration: u32) -> Self {
        Self {
            status: UnitStatus::Off,
            consecutive_duration: duration,
            last_output: 0.0,
        }
    }

    pub fn is_on(&self) -> bool {
        self.status.is_on()
    }

    /// State after one more timestep with the given status and output.
    pub fn step(&self, status: UnitStatus, output: f64) -> Self {
        let consecutive_duration = if status == self.status {
            self.consecutive_duration.saturating_add(1)
        } else {
            1
        };
        Self {
            status,
            consecutive_duration,
            last_output: if status.is_on() { output } else { 0.0 },
        }
    }

    /// State after the authoritative portion of a solved window.
    ///
    /// Folds the segment's entries in timestep order, so the dwell counter
    /// keeps counting when the status holds across the whole segment and
    /// restarts at the last flip otherwise. Pure: applying the same segment
    /// to the same carrier always yields the same result. An empty segment
    /// leaves the state unchanged.
    pub fn advance(&self, segment: &ScheduleSegment) -> Self {
        segment
            .entries
            .iter()
            .fold(self.clone(), |state, entry| state.step(entry.status, entry.output))
    }

    /// Steps the unit must still stay online before it may shut down.
    pub fn remaining_uptime(&self, unit: &UnitSpec) -> u32 {
        if self.is_on() {
            unit.min_uptime.saturating_sub(self.consecutive_duration)
        } else {
            0
        }
    }

    /// Steps the unit must still stay offline before it may start.
    pub fn remaining_downtime(&self, unit: &UnitSpec) -> u32 {
        if self.is_on() {
            0
        } else {
            unit.min_downtime.saturating_sub(self.consecutive_duration)
        }
    }

    /// Check the carrier's own invariants and its consistency with `unit`.
    pub fn validate_against(&self, unit: &UnitSpec) -> Result<(), ConfigError> {
        if self.consecutive_duration == 0 {
            return Err(ConfigError::InitialState(
                "consecutive_duration must be at least 1".to_string(),
            ));
        }
        if !self.last_output.is_finite() {
            return Err(ConfigError::InitialState(format!(
                "last_output must be finite (got {})",
                self.last_output
            )));
        }
        match self.status {
            UnitStatus::Off if self.last_output.abs() > FEASIBILITY_TOL => {
                Err(ConfigError::InitialState(format!(
                    "an offline unit must have zero output (got {})",
                    self.last_output
                )))
            }
            UnitStatus::On
                if self.last_output < unit.capacity_min - FEASIBILITY_TOL
                    || self.last_output > unit.capacity_max + FEASIBILITY_TOL =>
            {
                Err(ConfigError::InitialState(format!(
                    "online output {} is outside [{}, {}] of unit `{}`",
                    self.last_output, unit.capacity_min, unit.capacity_max, unit.name
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for StateCarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} for {} step(s), last output {:.3}",
            self.status, self.consecutive_duration, self.last_output
        )
    }
}
