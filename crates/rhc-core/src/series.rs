//! Driving data: per-timestep series aligned to the full horizon.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::DataAlignmentError;

/// Fixed status requirement for one timestep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusRequirement {
    /// The optimizer decides
    #[default]
    Free,
    /// The unit must be online
    On,
    /// The unit must be offline
    Off,
}

impl StatusRequirement {
    pub fn allows(self, on: bool) -> bool {
        match self {
            StatusRequirement::Free => true,
            StatusRequirement::On => on,
            StatusRequirement::Off => !on,
        }
    }
}

/// External series driving the schedule, indexed by horizon timestep.
///
/// Without a `residual_cost` the unit has to serve demand exactly at every
/// step. With one, an external supplier covers whatever the unit does not
/// produce, at that price per unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrivingData {
    pub demand: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_run: Option<Vec<StatusRequirement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_cost: Option<f64>,
}

impl DrivingData {
    pub fn new(demand: Vec<f64>) -> Self {
        Self {
            demand,
            must_run: None,
            residual_cost: None,
        }
    }

    pub fn with_must_run(mut self, must_run: Vec<StatusRequirement>) -> Self {
        self.must_run = Some(must_run);
        self
    }

    pub fn with_residual_cost(mut self, cost: f64) -> Self {
        self.residual_cost = Some(cost);
        self
    }

    /// Number of timesteps covered by every series.
    pub fn len(&self) -> usize {
        match &self.must_run {
            Some(must_run) => self.demand.len().min(must_run.len()),
            None => self.demand.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every series has a usable value at every timestep of
    /// `[0, horizon)`.
    pub fn check_coverage(&self, horizon: usize) -> Result<(), DataAlignmentError> {
        self.check_range(0..horizon)
    }

    fn check_range(&self, range: Range<usize>) -> Result<(), DataAlignmentError> {
        if let Some(cost) = self.residual_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(DataAlignmentError::ResidualCost(cost));
            }
        }
        if range.end > self.demand.len() {
            return Err(DataAlignmentError::Missing {
                series: "demand",
                timestep: self.demand.len().max(range.start),
                length: self.demand.len(),
            });
        }
        if let Some(must_run) = &self.must_run {
            if range.end > must_run.len() {
                return Err(DataAlignmentError::Missing {
                    series: "must_run",
                    timestep: must_run.len().max(range.start),
                    length: must_run.len(),
                });
            }
        }
        for timestep in range {
            let value = self.demand[timestep];
            if !value.is_finite() || value < 0.0 {
                return Err(DataAlignmentError::InvalidValue {
                    series: "demand",
                    timestep,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Read-only view of the series over `range`.
    pub fn window(&self, range: Range<usize>) -> Result<WindowData<'_>, DataAlignmentError> {
        self.check_range(range.clone())?;
        Ok(WindowData {
            start: range.start,
            demand: &self.demand[range.clone()],
            must_run: self.must_run.as_deref().map(|m| &m[range]),
            residual_cost: self.residual_cost,
        })
    }
}

/// Immutable slice of the driving data for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowData<'a> {
    /// Horizon timestep of the first element
    pub start: usize,
    pub demand: &'a [f64],
    pub must_run: Option<&'a [StatusRequirement]>,
    pub residual_cost: Option<f64>,
}

impl WindowData<'_> {
    pub fn len(&self) -> usize {
        self.demand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.demand.is_empty()
    }

    /// Status requirement at window-local index `i`.
    pub fn requirement(&self, i: usize) -> StatusRequirement {
        self.must_run
            .and_then(|m| m.get(i).copied())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_slices_are_aligned() {
        let data = DrivingData::new(vec![0.0, 4.0, 6.0, 8.0, 8.0, 5.0]).with_must_run(vec![
            StatusRequirement::Off,
            StatusRequirement::Free,
            StatusRequirement::Free,
            StatusRequirement::On,
            StatusRequirement::Free,
            StatusRequirement::Free,
        ]);
        let window = data.window(2..5).unwrap();
        assert_eq!(window.start, 2);
        assert_eq!(window.demand, &[6.0, 8.0, 8.0]);
        assert_eq!(window.requirement(0), StatusRequirement::Free);
        assert_eq!(window.requirement(1), StatusRequirement::On);
        assert_eq!(data.len(), 6);
    }

    #[test]
    fn test_missing_values_name_series_and_timestep() {
        let data = DrivingData::new(vec![1.0, 2.0, 3.0])
            .with_must_run(vec![StatusRequirement::Free; 2]);
        assert_eq!(
            data.check_coverage(3),
            Err(DataAlignmentError::Missing {
                series: "must_run",
                timestep: 2,
                length: 2
            })
        );
        assert_eq!(
            DrivingData::new(vec![1.0]).window(0..4).unwrap_err(),
            DataAlignmentError::Missing {
                series: "demand",
                timestep: 1,
                length: 1
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let data = DrivingData::new(vec![1.0, -2.0, 3.0]);
        assert!(matches!(
            data.check_coverage(3),
            Err(DataAlignmentError::InvalidValue { series: "demand", timestep: 1, .. })
        ));
        // only the requested range is inspected
        assert!(data.window(2..3).is_ok());

        let priced = DrivingData::new(vec![1.0]).with_residual_cost(f64::INFINITY);
        assert!(matches!(
            priced.check_coverage(1),
            Err(DataAlignmentError::ResidualCost(_))
        ));
    }

    #[test]
    fn test_requirement_semantics() {
        assert!(StatusRequirement::Free.allows(true));
        assert!(StatusRequirement::Free.allows(false));
        assert!(StatusRequirement::On.allows(true));
        assert!(!StatusRequirement::On.allows(false));
        assert!(!StatusRequirement::Off.allows(true));
    }
}
