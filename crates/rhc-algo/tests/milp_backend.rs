//! The MILP and dynamic-programming backends agree on full rolling runs.
#![cfg(any(feature = "solver-microlp", feature = "solver-highs"))]

use std::time::Duration;

use rhc_algo::{
    BackendKind, CommitmentBackend, DynamicProgrammingBackend, MilpBackend, RollingConfig,
    RollingHorizon,
};
use rhc_core::{DrivingData, FullSchedule, ScheduleError, StateCarrier, UnitSpec};

fn run_with(
    backend: &dyn CommitmentBackend,
    unit: &UnitSpec,
    data: &DrivingData,
    config: RollingConfig,
    initial: StateCarrier,
) -> Result<FullSchedule, ScheduleError> {
    RollingHorizon::new(unit, data, config, backend)
        .run(initial)
        .into_result()
}

#[test]
fn backends_agree_on_forced_dispatch() {
    let unit = UnitSpec::builder()
        .capacity(2.0, 10.0)
        .ramp(5.0, 5.0)
        .min_up_down(2, 1)
        .hot_warm_cold(1, 1.0, 3, 4.0, 5.0)
        .shutdown_cost(0.5)
        .build()
        .unwrap();
    let data = DrivingData::new(vec![0.0, 4.0, 6.0, 8.0, 8.0, 5.0, 0.0, 0.0, 3.0]);
    let initial = StateCarrier::online(2, 2.0);

    for (window_length, look_ahead) in [(3, 0), (4, 1), (9, 0)] {
        let config = RollingConfig::new(window_length, look_ahead);
        let dp = run_with(
            &DynamicProgrammingBackend::default(),
            &unit,
            &data,
            config.clone(),
            initial.clone(),
        )
        .unwrap();
        let milp = run_with(&MilpBackend, &unit, &data, config, initial.clone()).unwrap();

        assert_eq!(dp.statuses(), milp.statuses());
        assert_eq!(dp.total_startup_cost(), milp.total_startup_cost());
        // hot at t=1, warm at t=8
        assert_eq!(milp.total_startup_cost(), 5.0);
        assert_eq!(milp.totals().shutdowns, 2);
        for (a, b) in dp.outputs().iter().zip(milp.outputs()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}

#[test]
fn backends_agree_on_cost_with_residual_supply() {
    let unit = UnitSpec::builder()
        .capacity(2.0, 10.0)
        .ramp(3.0, 3.0)
        .min_up_down(2, 2)
        .hot_warm_cold(1, 2.0, 3, 6.0, 20.0)
        .variable_cost(1.0)
        .build()
        .unwrap();
    let data = DrivingData::new(vec![2.0, 8.0, 8.0, 3.0, 0.0, 0.0, 9.0, 9.0])
        .with_residual_cost(5.0);
    let initial = StateCarrier::offline(1);
    let config = RollingConfig::new(8, 0);

    let dp = run_with(
        &DynamicProgrammingBackend::default(),
        &unit,
        &data,
        config.clone(),
        initial.clone(),
    )
    .unwrap();
    let milp = run_with(&MilpBackend, &unit, &data, config, initial).unwrap();

    let (dp_total, milp_total) = (dp.totals().total(), milp.totals().total());
    assert!(
        (dp_total - milp_total).abs() < 1e-6,
        "dp {dp_total} vs milp {milp_total}"
    );
}

#[test]
fn milp_reports_infeasible_window() {
    let unit = UnitSpec::builder()
        .capacity(2.0, 10.0)
        .ramp(5.0, 5.0)
        .build()
        .unwrap();
    let data = DrivingData::new(vec![4.0, 4.0, 11.0]);
    let backend = BackendKind::Milp.create().unwrap();
    let config = RollingConfig::new(2, 0).with_timeout(Duration::from_secs(30));
    let outcome = RollingHorizon::new(&unit, &data, config, backend.as_ref())
        .run(StateCarrier::online(1, 4.0));
    assert_eq!(outcome.schedule().len(), 2);
    assert!(matches!(
        outcome.error(),
        Some(ScheduleError::WindowInfeasible { window: 1, .. })
    ));
}

#[test]
fn backends_agree_when_seam_ramp_binds() {
    let unit = UnitSpec::builder()
        .capacity(2.0, 10.0)
        .ramp(0.3, 0.5)
        .build()
        .unwrap();
    let data = DrivingData::new(vec![10.0; 6]).with_residual_cost(1.0);
    let initial = StateCarrier::online(5, 7.6);

    for config in [RollingConfig::new(2, 0), RollingConfig::new(3, 1)] {
        let dp = run_with(
            &DynamicProgrammingBackend::default(),
            &unit,
            &data,
            config.clone(),
            initial.clone(),
        )
        .unwrap();
        let milp = run_with(&MilpBackend, &unit, &data, config, initial.clone()).unwrap();

        assert_eq!(dp.statuses(), milp.statuses());
        let mut previous = initial.last_output;
        for (a, b) in dp.outputs().iter().zip(milp.outputs()) {
            assert!((a - b).abs() < 1e-6, "dp {a} vs milp {b}");
            assert!(b - previous <= unit.ramp_up_limit + 1e-6);
            previous = b;
        }
        assert!((milp.outputs()[5] - 9.4).abs() < 1e-6);
    }
}
