//! Dynamic-programming commitment backend.
//!
//! Forward recursion over states `(status, dwell, output level)`:
//!
//! - `dwell` is the number of steps the current status has been held, capped
//!   at the largest value any rule can distinguish (minimum up/down time and
//!   the last finite startup-tier bound + 1), so the state space stays small;
//! - output levels are a grid over the online range at `resolution`, plus the
//!   exact range endpoints, the startup/shutdown ramp limits and, for every
//!   online output of the previous step, that output held and moved by the
//!   full ramp limits. A path that is feasible through the seam therefore
//!   always survives, even when ramps are finer than the grid. Without a
//!   residual supplier the only level is the demand itself, which makes the
//!   recursion exact.
//!
//! Ties are broken deterministically in favour of the first state reached,
//! so the same formulation always yields the same assignment.

use std::collections::BTreeMap;
use std::time::Duration;

use rhc_core::{UnitStatus, FEASIBILITY_TOL};
use web_time::Instant;

use super::{Assignment, CommitmentBackend, CommitmentFormulation, SolveFailure};

const COST_EPS: f64 = 1e-9;

/// Exact DP over a discretized output range.
#[derive(Debug, Clone)]
pub struct DynamicProgrammingBackend {
    /// Spacing of the output grid when the unit can serve part of demand
    pub resolution: f64,
    /// Upper bound on output levels per step; the grid is coarsened beyond it
    pub max_levels: usize,
}

impl Default for DynamicProgrammingBackend {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_levels: 2001,
        }
    }
}

impl DynamicProgrammingBackend {
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Candidate outputs when online at step `t`, ascending. `previous`
    /// holds the online outputs reached at step `t - 1` (or the carried one).
    fn levels(&self, f: &CommitmentFormulation<'_>, t: usize, previous: &[f64]) -> Vec<f64> {
        let Some((lo, hi)) = f.online_range(t) else {
            return Vec::new();
        };
        if hi - lo <= FEASIBILITY_TOL {
            return vec![lo];
        }

        let span = hi - lo;
        let mut step = self.resolution;
        if span / step > self.max_levels.saturating_sub(1).max(1) as f64 {
            step = span / self.max_levels.saturating_sub(1).max(1) as f64;
        }

        let mut levels = vec![lo, hi];
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        levels.extend((first..=last).map(|k| k as f64 * step));
        for ramp in [f.unit.startup_ramp(), f.unit.shutdown_ramp()] {
            if ramp > lo && ramp < hi {
                levels.push(ramp);
            }
        }
        for &p in previous {
            for reach in [p, p + f.unit.ramp_up_limit, p - f.unit.ramp_down_limit] {
                levels.push(reach.clamp(lo, hi));
            }
        }
        levels.retain(|p| *p >= lo && *p <= hi);
        levels.sort_by(f64::total_cmp);
        levels.dedup_by(|a, b| (*a - *b).abs() <= FEASIBILITY_TOL);
        levels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct StateKey {
    on: bool,
    dwell: u32,
    level: usize,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    key: StateKey,
    output: f64,
    cost: f64,
    parent: usize,
}

/// Keep the cheaper of `node` and any node already stored under its key.
fn relax(index: &mut BTreeMap<StateKey, usize>, layer: &mut Vec<Node>, node: Node) {
    match index.get(&node.key) {
        Some(&i) => {
            if node.cost < layer[i].cost - COST_EPS {
                layer[i] = node;
            }
        }
        None => {
            index.insert(node.key, layer.len());
            layer.push(node);
        }
    }
}

impl CommitmentBackend for DynamicProgrammingBackend {
    fn id(&self) -> &str {
        "dp"
    }

    fn solve(
        &self,
        f: &CommitmentFormulation<'_>,
        timeout: Duration,
    ) -> Result<Assignment, SolveFailure> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(SolveFailure::Failed(format!(
                "output resolution must be positive (got {})",
                self.resolution
            )));
        }

        let started = Instant::now();
        let unit = f.unit;
        let dwell_cap = unit
            .min_uptime
            .max(unit.min_downtime)
            .max(unit.cold_after().saturating_add(1))
            .max(1);

        let root = Node {
            key: StateKey {
                on: f.initial.is_on(),
                dwell: f.initial.consecutive_duration.min(dwell_cap),
                level: 0,
            },
            output: if f.initial.is_on() {
                f.initial.last_output
            } else {
                0.0
            },
            cost: 0.0,
            parent: usize::MAX,
        };

        let n = f.len();
        let mut layers: Vec<Vec<Node>> = Vec::with_capacity(n + 1);
        layers.push(vec![root]);

        for t in 0..n {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(SolveFailure::TimedOut { elapsed });
            }

            let previous: Vec<f64> = layers[t]
                .iter()
                .filter(|node| node.key.on)
                .map(|node| node.output)
                .collect();
            let levels = self.levels(f, t, &previous);
            let requirement = f.requirement(t);
            let off_cost = f.operating_cost(t, 0.0);
            let mut index = BTreeMap::new();
            let mut layer = Vec::new();

            for (parent, prev) in layers[t].iter().enumerate() {
                let was_on = prev.key.on;

                if requirement.allows(false) && f.can_be_off(t) {
                    let transition = if was_on {
                        (prev.key.dwell >= unit.min_uptime
                            && f.ramp_allowed(true, prev.output, false, 0.0))
                        .then_some((unit.shutdown_cost, 1))
                    } else {
                        Some((0.0, prev.key.dwell.saturating_add(1).min(dwell_cap)))
                    };
                    if let Some((switch_cost, dwell)) = transition {
                        relax(
                            &mut index,
                            &mut layer,
                            Node {
                                key: StateKey {
                                    on: false,
                                    dwell,
                                    level: 0,
                                },
                                output: 0.0,
                                cost: prev.cost + switch_cost + off_cost,
                                parent,
                            },
                        );
                    }
                }

                if requirement.allows(true) {
                    let transition = if was_on {
                        Some((0.0, prev.key.dwell.saturating_add(1).min(dwell_cap)))
                    } else {
                        (prev.key.dwell >= unit.min_downtime)
                            .then(|| (unit.startup_cost(prev.key.dwell), 1))
                    };
                    let Some((switch_cost, dwell)) = transition else {
                        continue;
                    };
                    for (level, &output) in levels.iter().enumerate() {
                        if !f.ramp_allowed(was_on, prev.output, true, output) {
                            continue;
                        }
                        relax(
                            &mut index,
                            &mut layer,
                            Node {
                                key: StateKey {
                                    on: true,
                                    dwell,
                                    level,
                                },
                                output,
                                cost: prev.cost + switch_cost + f.operating_cost(t, output),
                                parent,
                            },
                        );
                    }
                }
            }

            if layer.is_empty() {
                return Err(SolveFailure::Infeasible(format!(
                    "no feasible commitment at timestep {} (demand {}, requirement {:?})",
                    f.timestep(t),
                    f.demand(t),
                    requirement
                )));
            }
            layers.push(layer);
        }

        let Some(last) = layers.last() else {
            return Ok(Assignment::default());
        };
        let mut best = 0;
        for (i, node) in last.iter().enumerate() {
            if node.cost < last[best].cost - COST_EPS {
                best = i;
            }
        }

        let mut path = Vec::with_capacity(n);
        let mut cursor = best;
        for t in (1..=n).rev() {
            let node = layers[t][cursor];
            path.push((node.key.on, node.output));
            cursor = node.parent;
        }
        path.reverse();

        let mut assignment = Assignment::with_capacity(n);
        for (on, output) in path {
            assignment.push(UnitStatus::from_on(on), output);
        }
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhc_core::{DrivingData, StateCarrier, StatusRequirement, UnitSpec};

    fn unit() -> UnitSpec {
        UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(5.0, 5.0)
            .min_up_down(2, 1)
            .hot_warm_cold(1, 1.0, 3, 4.0, 5.0)
            .build()
            .unwrap()
    }

    fn solve(
        unit: &UnitSpec,
        data: &DrivingData,
        initial: &StateCarrier,
    ) -> Result<Assignment, SolveFailure> {
        let window = data.window(0..data.len()).unwrap();
        let f = CommitmentFormulation::new(0, unit, window, initial, data.len());
        DynamicProgrammingBackend::default().solve(&f, Duration::from_secs(10))
    }

    #[test]
    fn test_forced_dispatch_follows_demand() {
        let unit = unit();
        let data = DrivingData::new(vec![0.0, 4.0, 6.0, 8.0, 8.0, 5.0]);
        let a = solve(&unit, &data, &StateCarrier::online(2, 2.0)).unwrap();
        assert_eq!(a.output, vec![0.0, 4.0, 6.0, 8.0, 8.0, 5.0]);
        assert_eq!(a.status[0], UnitStatus::Off);
        assert!(a.status[1..].iter().all(|s| s.is_on()));
    }

    #[test]
    fn test_infeasible_demand() {
        let unit = unit();
        let data = DrivingData::new(vec![4.0, 12.0]);
        let err = solve(&unit, &data, &StateCarrier::online(3, 4.0)).unwrap_err();
        match err {
            SolveFailure::Infeasible(reason) => assert!(reason.contains("timestep 1"), "{reason}"),
            other => panic!("expected infeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_residual_supply_chooses_cheaper_option() {
        // variable cost 1 vs residual 10: producing pays off once started
        let unit = UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(10.0, 10.0)
            .hot_warm_cold(1, 1.0, 3, 4.0, 50.0)
            .variable_cost(1.0)
            .build()
            .unwrap();
        let data = DrivingData::new(vec![6.0, 6.0, 6.0]).with_residual_cost(10.0);
        let a = solve(&unit, &data, &StateCarrier::offline(10)).unwrap();
        assert!(a.status.iter().all(|s| s.is_on()));
        assert_eq!(a.output, vec![6.0, 6.0, 6.0]);

        // a cold start costs more than the residual bill over one step
        let data = DrivingData::new(vec![3.0]).with_residual_cost(10.0);
        let a = solve(&unit, &data, &StateCarrier::offline(10)).unwrap();
        assert_eq!(a.status, vec![UnitStatus::Off]);
    }

    #[test]
    fn test_must_run_profile_is_honoured() {
        let unit = UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(10.0, 10.0)
            .variable_cost(5.0)
            .build()
            .unwrap();
        let data = DrivingData::new(vec![4.0, 4.0, 4.0])
            .with_residual_cost(1.0)
            .with_must_run(vec![
                StatusRequirement::Free,
                StatusRequirement::On,
                StatusRequirement::Free,
            ]);
        let a = solve(&unit, &data, &StateCarrier::offline(1)).unwrap();
        assert_eq!(a.status, vec![UnitStatus::Off, UnitStatus::On, UnitStatus::Off]);
        // cheapest online output is minimum load
        assert_eq!(a.output[1], 2.0);
    }

    #[test]
    fn test_zero_timeout_times_out() {
        let unit = unit();
        let data = DrivingData::new(vec![4.0; 4]);
        let window = data.window(0..4).unwrap();
        let initial = StateCarrier::online(3, 4.0);
        let f = CommitmentFormulation::new(0, &unit, window, &initial, 4);
        let result = DynamicProgrammingBackend::default().solve(&f, Duration::ZERO);
        assert!(matches!(result, Err(SolveFailure::TimedOut { .. })));
    }

    #[test]
    fn test_levels_include_endpoints_and_ramps() {
        let unit = UnitSpec::builder()
            .capacity(2.5, 7.5)
            .ramp(3.2, 1.0)
            .build()
            .unwrap();
        let data = DrivingData::new(vec![7.0]).with_residual_cost(1.0);
        let initial = StateCarrier::offline(1);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..1).unwrap(), &initial, 1);
        let levels = DynamicProgrammingBackend::default().levels(&f, 0, &[]);
        assert_eq!(levels, vec![2.5, 3.0, 3.2, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_levels_follow_previous_outputs() {
        let unit = UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(0.3, 0.5)
            .build()
            .unwrap();
        let data = DrivingData::new(vec![10.0]).with_residual_cost(1.0);
        let initial = StateCarrier::online(5, 7.6);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..1).unwrap(), &initial, 1);
        let levels = DynamicProgrammingBackend::default().levels(&f, 0, &[7.6, 9.9]);
        for expected in [7.1, 7.6, 7.9, 9.4, 9.9, 10.0] {
            assert!(
                levels.iter().any(|l| (l - expected).abs() < 1e-9),
                "missing level {expected} in {levels:?}"
            );
        }
    }

    #[test]
    fn test_ramps_finer_than_grid_from_off_grid_output() {
        let unit = UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(0.3, 0.5)
            .build()
            .unwrap();
        let data = DrivingData::new(vec![10.0, 10.0]).with_residual_cost(1.0);
        let a = solve(&unit, &data, &StateCarrier::online(5, 7.6)).unwrap();
        assert!(a.status.iter().all(|s| s.is_on()));
        assert!((a.output[0] - 7.9).abs() < 1e-9, "{:?}", a.output);
        assert!((a.output[1] - 8.2).abs() < 1e-9, "{:?}", a.output);
    }

    #[test]
    fn test_unbounded_warm_tier_prices_startups() {
        // warm bound at u32::MAX: the dwell cap must not wrap around
        let unit = UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(5.0, 5.0)
            .hot_warm_cold(1, 1.0, u32::MAX, 2.0, 3.0)
            .build()
            .unwrap();
        // residual bill for the step is 1.6: a hot start pays off, a warm one does not
        let data = DrivingData::new(vec![4.0]).with_residual_cost(0.4);

        let a = solve(&unit, &data, &StateCarrier::offline(1)).unwrap();
        assert_eq!(a.status, vec![UnitStatus::On]);

        let a = solve(&unit, &data, &StateCarrier::offline(5)).unwrap();
        assert_eq!(a.status, vec![UnitStatus::Off]);
    }
}
