//! # MILP Commitment Backend
//!
//! Standard three-binary unit-commitment model built with `good_lp`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VARIABLES (per step t)                                                 │
//! │    u_t ∈ {0,1} online     v_t ∈ {0,1} startup     w_t ∈ {0,1} shutdown  │
//! │    p_t ≥ 0 output         c_t ≥ 0 startup cost                          │
//! │                                                                         │
//! │  LOGIC          u_t - u_{t-1} = v_t - w_t,   v_t + w_t ≤ 1              │
//! │  CAPACITY       Pmin·u_t ≤ p_t ≤ Pmax·u_t,   p_t ≤ d_t                  │
//! │  RAMP           p_t - p_{t-1} ≤ RU·u_{t-1} + SU·v_t                     │
//! │                 p_{t-1} - p_t ≤ RD·u_t + SD·w_t                         │
//! │  MIN UP/DOWN    Σ_{s>t-UT} v_s ≤ u_t,   Σ_{s>t-DT} w_s ≤ 1 - u_t        │
//! │  STARTUP TIERS  c_t ≥ C_1·v_t                                           │
//! │                 c_t ≥ C_k·(v_t - Σ_{s=t-b_{k-1}}^{t-1} w_s)             │
//! │                                                                         │
//! │  u_{-1}, p_{-1} come from the carried state; a unit carried offline for │
//! │  D steps counts as having shut down at s = -D.                          │
//! │  SU = max(RU, Pmin), SD = max(RD, Pmin).                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Objective: `Σ_t var·p_t + res·(d_t - p_t) + c_t + SDcost·w_t`.
//!
//! The tier constraints rely on non-decreasing tier costs, which
//! [`UnitSpec::validate`](rhc_core::UnitSpec::validate) guarantees.

use std::time::Duration;

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as mip_solver;
#[cfg(all(feature = "solver-microlp", not(feature = "solver-highs")))]
use good_lp::solvers::microlp::microlp as mip_solver;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use rhc_core::{StatusRequirement, UnitStatus};
use web_time::Instant;

use super::{Assignment, CommitmentBackend, CommitmentFormulation, SolveFailure};

/// Mixed-integer backend using the solver selected at compile time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpBackend;

impl MilpBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CommitmentBackend for MilpBackend {
    fn id(&self) -> &str {
        "milp"
    }

    fn solve(
        &self,
        f: &CommitmentFormulation<'_>,
        timeout: Duration,
    ) -> Result<Assignment, SolveFailure> {
        let started = Instant::now();
        let n = f.len();
        if n == 0 {
            return Ok(Assignment::default());
        }
        let unit = f.unit;

        // Steps with no admissible status at all never reach the solver.
        for t in 0..n {
            let requirement = f.requirement(t);
            let on_ok = requirement.allows(true) && f.online_range(t).is_some();
            let off_ok = requirement.allows(false) && f.can_be_off(t);
            if !on_ok && !off_ok {
                return Err(SolveFailure::Infeasible(format!(
                    "no admissible status at timestep {} (demand {}, requirement {:?})",
                    f.timestep(t),
                    f.demand(t),
                    requirement
                )));
            }
        }

        // === Variables ===
        let mut vars = variables!();
        let max_tier_cost = unit
            .startup_tiers
            .iter()
            .map(|tier| tier.cost)
            .fold(0.0, f64::max);

        let u: Vec<Variable> = (0..n).map(|_| vars.add(variable().binary())).collect();
        let v: Vec<Variable> = (0..n).map(|_| vars.add(variable().binary())).collect();
        let w: Vec<Variable> = (0..n).map(|_| vars.add(variable().binary())).collect();
        let p: Vec<Variable> = (0..n)
            .map(|_| vars.add(variable().min(0.0).max(unit.capacity_max)))
            .collect();
        let c: Vec<Variable> = (0..n)
            .map(|_| vars.add(variable().min(0.0).max(max_tier_cost)))
            .collect();

        // === Objective ===
        let residual_price = f.residual_cost().unwrap_or(0.0);
        let mut objective = Expression::from(0.0);
        for t in 0..n {
            objective += p[t] * (unit.variable_cost - residual_price);
            objective += residual_price * f.demand(t);
            objective += c[t];
            objective += w[t] * unit.shutdown_cost;
        }

        let mut model = vars.minimise(objective).using(mip_solver);

        // === Constraints ===
        let initial_on = if f.initial.is_on() { 1.0 } else { 0.0 };
        let initial_output = if f.initial.is_on() {
            f.initial.last_output
        } else {
            0.0
        };
        let su = unit.startup_ramp();
        let sd = unit.shutdown_ramp();

        for t in 0..n {
            let prev_u = if t == 0 {
                Expression::from(initial_on)
            } else {
                Expression::from(u[t - 1])
            };
            let prev_p = if t == 0 {
                Expression::from(initial_output)
            } else {
                Expression::from(p[t - 1])
            };

            // Commitment logic
            model = model.with(constraint!(
                Expression::from(u[t]) - prev_u.clone() == v[t] - w[t]
            ));
            model = model.with(constraint!(v[t] + w[t] <= 1.0));

            // Status requirements
            match f.requirement(t) {
                StatusRequirement::On => model = model.with(constraint!(u[t] == 1.0)),
                StatusRequirement::Off => model = model.with(constraint!(u[t] == 0.0)),
                StatusRequirement::Free => {}
            }
            if f.online_range(t).is_none() {
                model = model.with(constraint!(u[t] == 0.0));
            }

            // Capacity and demand
            model = model.with(constraint!(p[t] >= unit.capacity_min * u[t]));
            model = model.with(constraint!(p[t] <= unit.capacity_max * u[t]));
            if f.residual_cost().is_some() {
                model = model.with(constraint!(p[t] <= f.demand(t)));
            } else {
                model = model.with(constraint!(p[t] == f.demand(t)));
            }

            // Ramp limits, with startup/shutdown allowances
            model = model.with(constraint!(
                Expression::from(p[t]) - prev_p.clone()
                    <= prev_u.clone() * unit.ramp_up_limit + v[t] * su
            ));
            model = model.with(constraint!(
                prev_p - p[t] <= u[t] * unit.ramp_down_limit + w[t] * sd
            ));

            // Minimum up and down times within the window
            let up_from = (t + 1).saturating_sub(unit.min_uptime as usize);
            let mut recent_starts = Expression::from(0.0);
            for &vs in &v[up_from..=t] {
                recent_starts += vs;
            }
            model = model.with(constraint!(recent_starts <= u[t]));

            let down_from = (t + 1).saturating_sub(unit.min_downtime as usize);
            let mut recent_stops = Expression::from(0.0);
            for &ws in &w[down_from..=t] {
                recent_stops += ws;
            }
            model = model.with(constraint!(recent_stops + u[t] <= 1.0));

            // Startup cost tiers
            let tiers = &unit.startup_tiers;
            if let Some(hot) = tiers.first() {
                model = model.with(constraint!(c[t] >= v[t] * hot.cost));
            }
            for k in 1..tiers.len() {
                let Some(bound) = tiers[k - 1].max_off_duration else {
                    continue;
                };
                let bound = bound as usize;
                let mut warm_off = Expression::from(0.0);
                for &ws in &w[t.saturating_sub(bound)..t] {
                    warm_off += ws;
                }
                if !f.initial.is_on() && t + f.initial.consecutive_duration as usize <= bound {
                    warm_off += 1.0;
                }
                let active = Expression::from(v[t]) - warm_off;
                model = model.with(constraint!(c[t] >= active * tiers[k].cost));
            }
        }

        // Seam dwell: the model above only sees in-window transitions.
        for t in 0..f.forced_on().min(n) {
            model = model.with(constraint!(u[t] == 1.0));
        }
        for t in 0..f.forced_off().min(n) {
            model = model.with(constraint!(u[t] == 0.0));
        }

        // === Solve ===
        #[cfg(feature = "solver-highs")]
        let model = {
            use good_lp::solvers::WithTimeLimit;
            model.with_time_limit(timeout.saturating_sub(started.elapsed()).as_secs_f64())
        };
        let result = model.solve();

        // A solver stopped by its limit may report anything; the budget wins.
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            return Err(SolveFailure::TimedOut { elapsed });
        }
        let solution = match result {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                return Err(SolveFailure::Infeasible(format!(
                    "MILP for timesteps {}..{} has no feasible solution",
                    f.timestep(0),
                    f.timestep(n)
                )))
            }
            Err(other) => return Err(SolveFailure::Failed(other.to_string())),
        };

        // === Extract Results ===
        let mut assignment = Assignment::with_capacity(n);
        for t in 0..n {
            let on = solution.value(u[t]) > 0.5;
            let output = solution.value(p[t]).max(0.0);
            assignment.push(UnitStatus::from_on(on), output);
        }
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::DynamicProgrammingBackend;
    use rhc_core::{DrivingData, StateCarrier, UnitSpec};

    fn unit() -> UnitSpec {
        UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(5.0, 5.0)
            .min_up_down(2, 1)
            .hot_warm_cold(1, 1.0, 3, 4.0, 5.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_forced_dispatch_matches_demand() {
        let unit = unit();
        let data = DrivingData::new(vec![0.0, 4.0, 6.0, 8.0, 8.0, 5.0]);
        let initial = StateCarrier::online(2, 2.0);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..6).unwrap(), &initial, 6);
        let a = MilpBackend.solve(&f, Duration::from_secs(30)).unwrap();
        assert_eq!(f.check(&a), Ok(()));
        assert_eq!(a.status[0], UnitStatus::Off);
        assert!((f.objective(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_prefilter_reports_unservable_step() {
        let unit = unit();
        let data = DrivingData::new(vec![4.0, 11.0]);
        let initial = StateCarrier::online(3, 4.0);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..2).unwrap(), &initial, 2);
        let err = MilpBackend.solve(&f, Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, SolveFailure::Infeasible(ref r) if r.contains("timestep 1")));
    }

    #[test]
    fn test_ramp_infeasibility_reported_by_solver() {
        // 2 -> 9 needs a ramp of 7 with a limit of 5
        let unit = unit();
        let data = DrivingData::new(vec![2.0, 9.0]);
        let initial = StateCarrier::online(3, 2.0);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..2).unwrap(), &initial, 2);
        let err = MilpBackend.solve(&f, Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, SolveFailure::Infeasible(_)));
    }

    #[test]
    fn test_tiered_startup_matches_dp() {
        let unit = UnitSpec::builder()
            .capacity(2.0, 10.0)
            .ramp(10.0, 10.0)
            .min_up_down(1, 1)
            .hot_warm_cold(1, 1.0, 3, 4.0, 5.0)
            .variable_cost(1.0)
            .build()
            .unwrap();
        let data = DrivingData::new(vec![5.0, 0.0, 0.0, 6.0, 0.0, 0.0, 0.0, 0.0, 3.0]);
        let initial = StateCarrier::offline(1);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..9).unwrap(), &initial, 9);

        let milp = MilpBackend.solve(&f, Duration::from_secs(30)).unwrap();
        let dp = DynamicProgrammingBackend::default()
            .solve(&f, Duration::from_secs(30))
            .unwrap();
        assert_eq!(f.check(&milp), Ok(()));
        assert_eq!(milp.status, dp.status);
        // hot (1) + warm (4) + cold (5) startups plus 14 of output
        assert!((f.objective(&milp) - 24.0).abs() < 1e-6);
        assert!((f.objective(&dp) - 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_exhausted_budget_reports_timeout() {
        let unit = unit();
        let data = DrivingData::new(vec![4.0, 4.0, 4.0]);
        let initial = StateCarrier::online(3, 4.0);
        let f = CommitmentFormulation::new(0, &unit, data.window(0..3).unwrap(), &initial, 3);
        let err = MilpBackend.solve(&f, Duration::ZERO).unwrap_err();
        assert!(matches!(err, SolveFailure::TimedOut { .. }), "{err:?}");
    }
}
