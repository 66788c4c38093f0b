//! Single-window commitment problem.
//!
//! A [`CommitmentFormulation`] bundles everything a backend needs to solve
//! one window: the unit, the window's demand and status requirements, and the
//! seam conditions carried from the previous window. It also knows how to
//! check and price a candidate [`Assignment`], so every backend is judged by
//! the same rules.
//!
//! Constraints:
//!
//! - off ⇒ output 0; on ⇒ `capacity_min ≤ output ≤ capacity_max`
//! - `output ≤ demand`, and `output = demand` when no residual supplier exists
//! - ramp limits between consecutive online steps, including the seam;
//!   a startup step reaches at most `max(ramp_up, capacity_min)` and a
//!   shutdown follows an output of at most `max(ramp_down, capacity_min)`
//! - minimum up/down times, counting the dwell carried across the seam
//! - the must-run profile
//!
//! Objective: variable cost + residual supply cost + tiered startup cost +
//! shutdown cost.

use rhc_core::{
    StateCarrier, StatusRequirement, UnitSpec, UnitStatus, WindowData, FEASIBILITY_TOL,
};

use super::Assignment;

/// Commitment problem for one window.
#[derive(Debug, Clone, Copy)]
pub struct CommitmentFormulation<'a> {
    /// Window counter, for diagnostics
    pub window: usize,
    pub unit: &'a UnitSpec,
    pub data: WindowData<'a>,
    /// State at the end of the previous window
    pub initial: &'a StateCarrier,
    /// Number of leading steps that are kept in the schedule
    pub authoritative_len: usize,
}

impl<'a> CommitmentFormulation<'a> {
    pub fn new(
        window: usize,
        unit: &'a UnitSpec,
        data: WindowData<'a>,
        initial: &'a StateCarrier,
        authoritative_len: usize,
    ) -> Self {
        Self {
            window,
            unit,
            data,
            initial,
            authoritative_len,
        }
    }

    /// Number of steps, look-ahead included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Horizon timestep of window step `t`.
    pub fn timestep(&self, t: usize) -> usize {
        self.data.start + t
    }

    pub fn demand(&self, t: usize) -> f64 {
        self.data.demand[t]
    }

    pub fn residual_cost(&self) -> Option<f64> {
        self.data.residual_cost
    }

    /// Leading steps the unit must stay online to honour its minimum uptime.
    pub fn forced_on(&self) -> usize {
        self.initial.remaining_uptime(self.unit) as usize
    }

    /// Leading steps the unit must stay offline to honour its minimum downtime.
    pub fn forced_off(&self) -> usize {
        self.initial.remaining_downtime(self.unit) as usize
    }

    /// Fixed status at step `t`, combining the must-run profile with the
    /// dwell carried across the seam.
    pub fn requirement(&self, t: usize) -> StatusRequirement {
        if t < self.forced_on() {
            return match self.data.requirement(t) {
                StatusRequirement::Off => StatusRequirement::Off,
                _ => StatusRequirement::On,
            };
        }
        if t < self.forced_off() {
            return match self.data.requirement(t) {
                StatusRequirement::On => StatusRequirement::On,
                _ => StatusRequirement::Off,
            };
        }
        self.data.requirement(t)
    }

    /// Output interval when online at step `t`, or `None` if the unit cannot
    /// be online there.
    pub fn online_range(&self, t: usize) -> Option<(f64, f64)> {
        let demand = self.demand(t);
        let (min, max) = (self.unit.capacity_min, self.unit.capacity_max);
        match self.residual_cost() {
            None if demand >= min - FEASIBILITY_TOL && demand <= max + FEASIBILITY_TOL => {
                Some((demand, demand))
            }
            None => None,
            Some(_) => {
                let upper = max.min(demand);
                (upper >= min - FEASIBILITY_TOL).then_some((min, upper.max(min)))
            }
        }
    }

    /// Whether the unit may be offline at step `t` as far as demand goes.
    pub fn can_be_off(&self, t: usize) -> bool {
        self.residual_cost().is_some() || self.demand(t) <= FEASIBILITY_TOL
    }

    /// Variable plus residual supply cost of producing `output` at step `t`.
    pub fn operating_cost(&self, t: usize, output: f64) -> f64 {
        let residual = self
            .residual_cost()
            .map_or(0.0, |price| price * (self.demand(t) - output).max(0.0));
        self.unit.variable_cost * output + residual
    }

    /// Whether moving from `(prev_on, prev_output)` to `(on, output)` respects
    /// the ramp limits.
    pub fn ramp_allowed(&self, prev_on: bool, prev_output: f64, on: bool, output: f64) -> bool {
        match (prev_on, on) {
            (true, true) => {
                output - prev_output <= self.unit.ramp_up_limit + FEASIBILITY_TOL
                    && prev_output - output <= self.unit.ramp_down_limit + FEASIBILITY_TOL
            }
            (false, true) => output <= self.unit.startup_ramp() + FEASIBILITY_TOL,
            (true, false) => prev_output <= self.unit.shutdown_ramp() + FEASIBILITY_TOL,
            (false, false) => true,
        }
    }

    /// Check an assignment against every constraint of the window.
    ///
    /// Returns a description of the first violation found.
    pub fn check(&self, assignment: &Assignment) -> Result<(), String> {
        let n = self.len();
        if assignment.status.len() != n || assignment.output.len() != n {
            return Err(format!(
                "assignment covers {} status and {} output values for {n} steps",
                assignment.status.len(),
                assignment.output.len()
            ));
        }

        let mut state = self.initial.clone();
        for t in 0..n {
            let on = assignment.status[t].is_on();
            let output = assignment.output[t];
            let ts = self.timestep(t);

            if !output.is_finite() {
                return Err(format!("non-finite output {output} at timestep {ts}"));
            }
            if !self.requirement(t).allows(on) {
                return Err(format!(
                    "status {} at timestep {ts} violates the required {:?}",
                    assignment.status[t],
                    self.requirement(t)
                ));
            }
            if on {
                let (lo, hi) = self
                    .online_range(t)
                    .ok_or_else(|| format!("unit cannot be online at timestep {ts}"))?;
                if output < lo - FEASIBILITY_TOL || output > hi + FEASIBILITY_TOL {
                    return Err(format!(
                        "output {output} at timestep {ts} outside [{lo}, {hi}]"
                    ));
                }
            } else {
                if output.abs() > FEASIBILITY_TOL {
                    return Err(format!("offline unit produces {output} at timestep {ts}"));
                }
                if !self.can_be_off(t) {
                    return Err(format!(
                        "demand {} at timestep {ts} is unserved while offline",
                        self.demand(t)
                    ));
                }
            }
            if !self.ramp_allowed(state.is_on(), state.last_output, on, output) {
                return Err(format!(
                    "ramp from {} to {output} at timestep {ts} exceeds the unit's limits",
                    state.last_output
                ));
            }
            match (state.is_on(), on) {
                (true, false) if state.consecutive_duration < self.unit.min_uptime => {
                    return Err(format!(
                        "shutdown at timestep {ts} after {} step(s) online (minimum {})",
                        state.consecutive_duration, self.unit.min_uptime
                    ));
                }
                (false, true) if state.consecutive_duration < self.unit.min_downtime => {
                    return Err(format!(
                        "startup at timestep {ts} after {} step(s) offline (minimum {})",
                        state.consecutive_duration, self.unit.min_downtime
                    ));
                }
                _ => {}
            }
            state = state.step(assignment.status[t], output);
        }
        Ok(())
    }

    /// Total cost of an assignment over the whole window.
    pub fn objective(&self, assignment: &Assignment) -> f64 {
        let mut state = self.initial.clone();
        let mut cost = 0.0;
        for (t, (&status, &output)) in assignment
            .status
            .iter()
            .zip(&assignment.output)
            .enumerate()
        {
            match (state.status, status) {
                (UnitStatus::Off, UnitStatus::On) => {
                    cost += self.unit.startup_cost(state.consecutive_duration)
                }
                (UnitStatus::On, UnitStatus::Off) => cost += self.unit.shutdown_cost,
                _ => {}
            }
            let produced = if status.is_on() { output } else { 0.0 };
            cost += self.operating_cost(t, produced);
            state = state.step(status, output);
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhc_core::DrivingData;

    fn unit() -> UnitSpec {
        UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(3.0, 3.0)
            .min_up_down(2, 2)
            .hot_warm_cold(1, 1.0, 3, 4.0, 5.0)
            .variable_cost(1.0)
            .build()
            .unwrap()
    }

    fn assignment(statuses: &[bool], outputs: &[f64]) -> Assignment {
        Assignment {
            status: statuses.iter().map(|&on| UnitStatus::from_on(on)).collect(),
            output: outputs.to_vec(),
        }
    }

    #[test]
    fn test_forced_steps_from_seam() {
        let unit = unit();
        let data = DrivingData::new(vec![4.0, 4.0, 4.0]);
        let initial = StateCarrier::online(1, 3.0);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..3).unwrap(), &initial, 3);
        assert_eq!(f.forced_on(), 1);
        assert_eq!(f.forced_off(), 0);
        assert_eq!(f.requirement(0), StatusRequirement::On);
        assert_eq!(f.requirement(1), StatusRequirement::Free);
    }

    #[test]
    fn test_check_accepts_forced_dispatch() {
        let unit = unit();
        let data = DrivingData::new(vec![0.0, 0.0, 3.0, 5.0]);
        let initial = StateCarrier::offline(1);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..4).unwrap(), &initial, 4);
        let a = assignment(&[false, false, true, true], &[0.0, 0.0, 3.0, 5.0]);
        assert_eq!(f.check(&a), Ok(()));
        // warm start after three steps offline, plus variable cost 8
        assert!((f.objective(&a) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_check_rejects_violations() {
        let unit = unit();
        let data = DrivingData::new(vec![0.0, 3.0, 7.0, 0.0]);
        let initial = StateCarrier::offline(1);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..4).unwrap(), &initial, 4);

        // startup before the minimum downtime has elapsed
        let early = assignment(&[true, true, true, false], &[0.0, 3.0, 7.0, 0.0]);
        assert!(f.check(&early).is_err());

        // ramp 3 -> 7 exceeds the limit of 3
        let steep = assignment(&[false, true, true, false], &[0.0, 3.0, 7.0, 0.0]);
        let err = f.check(&steep).unwrap_err();
        assert!(err.contains("ramp"), "{err}");

        let short = assignment(&[false], &[0.0]);
        assert!(f.check(&short).is_err());
    }

    #[test]
    fn test_residual_supply_relaxes_demand() {
        let unit = unit();
        let data = DrivingData::new(vec![1.0, 6.0, 20.0]).with_residual_cost(10.0);
        let initial = StateCarrier::offline(5);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..3).unwrap(), &initial, 3);
        assert!(f.can_be_off(1));
        assert_eq!(f.online_range(0), None);
        assert_eq!(f.online_range(1), Some((2.0, 6.0)));
        assert_eq!(f.online_range(2), Some((2.0, 10.0)));
        assert!((f.operating_cost(1, 4.0) - (4.0 + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_convention_at_startup_and_shutdown() {
        let unit = UnitSpec::builder()
            .capacity(5.0, 10.0)
            .ramp(2.0, 2.0)
            .build()
            .unwrap();
        let data = DrivingData::new(vec![0.0]);
        let initial = StateCarrier::offline(1);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..1).unwrap(), &initial, 1);
        // startup may land on minimum load even though it exceeds the ramp
        assert!(f.ramp_allowed(false, 0.0, true, 5.0));
        assert!(!f.ramp_allowed(false, 0.0, true, 6.0));
        assert!(f.ramp_allowed(true, 5.0, false, 0.0));
        assert!(!f.ramp_allowed(true, 8.0, false, 0.0));
        assert!(!f.ramp_allowed(true, 5.0, true, 8.0));
    }
}
