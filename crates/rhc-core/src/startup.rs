//! Startup tiers and the startup cost evaluator.
//!
//! A unit that has been off for a short time restarts "hot" and cheaply; the
//! longer it stays off the more expensive the restart becomes. Tiers are keyed
//! by the maximum off-duration (in timesteps) they cover, in increasing order,
//! with the last tier unbounded.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One startup cost bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartupTier {
    /// Longest off-duration (timesteps) this tier covers. `None` is unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_off_duration: Option<u32>,
    /// Cost charged once per startup in this tier
    pub cost: f64,
}

impl StartupTier {
    /// Tier covering off-durations up to and including `max_off_duration`.
    pub fn bounded(max_off_duration: u32, cost: f64) -> Self {
        Self {
            max_off_duration: Some(max_off_duration),
            cost,
        }
    }

    /// Tier covering every off-duration not claimed by an earlier tier.
    pub fn unbounded(cost: f64) -> Self {
        Self {
            max_off_duration: None,
            cost,
        }
    }

    /// Whether an outage of `off_duration` timesteps falls within this tier's bound.
    pub fn covers(&self, off_duration: u32) -> bool {
        self.max_off_duration
            .map_or(true, |bound| off_duration <= bound)
    }
}

/// Three-tier shorthand: hot up to `t_hot` steps off, warm up to `t_warm`,
/// cold for anything longer.
pub fn hot_warm_cold(
    t_hot: u32,
    c_hot: f64,
    t_warm: u32,
    c_warm: f64,
    c_cold: f64,
) -> Vec<StartupTier> {
    vec![
        StartupTier::bounded(t_hot, c_hot),
        StartupTier::bounded(t_warm, c_warm),
        StartupTier::unbounded(c_cold),
    ]
}

/// Index of the tier that applies to a startup after `off_duration` steps off.
///
/// Returns `None` only when no tier covers the duration, which cannot happen
/// for tiers accepted by [`validate_tiers`].
pub fn classify(off_duration: u32, tiers: &[StartupTier]) -> Option<usize> {
    tiers.iter().position(|tier| tier.covers(off_duration))
}

/// Cost of a startup after `off_duration` steps off.
///
/// Scans tiers in order and returns the cost of the first one whose bound is
/// not exceeded.
///
/// Expects tiers accepted by [`validate_tiers`]. Debug builds panic on an
/// uncovered duration; release builds charge the last tier's cost, or zero
/// when there are no tiers.
pub fn startup_cost(off_duration: u32, tiers: &[StartupTier]) -> f64 {
    match classify(off_duration, tiers) {
        Some(index) => tiers[index].cost,
        None => {
            debug_assert!(
                false,
                "no startup tier covers an off duration of {off_duration}"
            );
            tiers.last().map_or(0.0, |tier| tier.cost)
        }
    }
}

/// Human-readable tier name: hot/warm/cold for the usual three tiers.
pub fn tier_label(index: usize, tier_count: usize) -> String {
    match (index, tier_count) {
        (0, 1) => "cold".to_string(),
        (0, _) => "hot".to_string(),
        (i, n) if i + 1 == n => "cold".to_string(),
        (1, 3) => "warm".to_string(),
        (i, _) => format!("tier{}", i + 1),
    }
}

/// Check that tiers cover `[0, ∞)` without gaps and that costs never fall
/// from one tier to the next.
pub fn validate_tiers(tiers: &[StartupTier]) -> Result<(), ConfigError> {
    if tiers.is_empty() {
        return Err(ConfigError::NoStartupTiers);
    }

    let mut previous_bound: Option<u32> = None;
    let mut previous_cost: Option<f64> = None;
    let last = tiers.len() - 1;

    for (index, tier) in tiers.iter().enumerate() {
        if !tier.cost.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "startup_tiers.cost",
                value: tier.cost,
            });
        }
        if tier.cost < 0.0 {
            return Err(ConfigError::Negative {
                field: "startup_tiers.cost",
                value: tier.cost,
            });
        }
        if let Some(previous) = previous_cost {
            if tier.cost < previous {
                return Err(ConfigError::TierCostDecreasing {
                    index,
                    cost: tier.cost,
                    previous,
                });
            }
        }

        match tier.max_off_duration {
            None if index != last => return Err(ConfigError::UnboundedTierNotLast { index }),
            None => {}
            Some(bound) if index == last => return Err(ConfigError::LastTierBounded { bound }),
            Some(bound) => {
                if let Some(previous) = previous_bound {
                    if bound <= previous {
                        return Err(ConfigError::TierOrder {
                            index,
                            bound,
                            previous,
                        });
                    }
                }
                previous_bound = Some(bound);
            }
        }
        previous_cost = Some(tier.cost);
    }

    Ok(())
}

/// Largest finite tier bound, i.e. the off-duration beyond which every
/// startup is cold. Zero for a single unbounded tier.
pub fn last_finite_bound(tiers: &[StartupTier]) -> u32 {
    tiers
        .iter()
        .filter_map(|tier| tier.max_off_duration)
        .max()
        .unwrap_or(0)
}
