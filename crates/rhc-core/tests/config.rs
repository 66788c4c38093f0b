//! Deserializing unit, state and data descriptions from TOML.

use rhc_core::{
    ConfigError, DrivingData, StartupTier, StateCarrier, StatusRequirement, UnitSpec, UnitStatus,
};

const UNIT_TOML: &str = r#"
name = "chp"
capacity_min = 2.0
capacity_max = 10.0
ramp_up_limit = 5.0
ramp_down_limit = 5.0
min_uptime = 2
min_downtime = 1
shutdown_cost = 0.5

[[startup_tiers]]
max_off_duration = 1
cost = 1.0

[[startup_tiers]]
max_off_duration = 3
cost = 4.0

[[startup_tiers]]
cost = 5.0
"#;

#[test]
fn unit_from_toml() {
    let unit: UnitSpec = toml::from_str(UNIT_TOML).expect("parse unit");
    unit.validate().expect("valid unit");

    assert_eq!(unit.name, "chp");
    assert_eq!(unit.min_uptime, 2);
    assert_eq!(unit.shutdown_cost, 0.5);
    assert_eq!(
        unit.startup_tiers,
        vec![
            StartupTier::bounded(1, 1.0),
            StartupTier::bounded(3, 4.0),
            StartupTier::unbounded(5.0),
        ]
    );
}

#[test]
fn deserialized_unit_is_validated_separately() {
    let bad = UNIT_TOML.replace("capacity_min = 2.0", "capacity_min = 12.0");
    let unit: UnitSpec = toml::from_str(&bad).expect("syntactically valid");
    assert!(matches!(
        unit.validate(),
        Err(ConfigError::CapacityBounds { .. })
    ));
}

#[test]
fn carrier_and_data_from_toml() {
    let carrier: StateCarrier = toml::from_str(
        r#"
status = "on"
consecutive_duration = 3
last_output = 6.5
"#,
    )
    .expect("parse carrier");
    assert_eq!(carrier.status, UnitStatus::On);
    assert_eq!(carrier, StateCarrier::online(3, 6.5));

    let offline: StateCarrier =
        toml::from_str("status = \"off\"\nconsecutive_duration = 4\n").expect("parse carrier");
    assert_eq!(offline, StateCarrier::offline(4));

    let data: DrivingData = toml::from_str(
        r#"
demand = [0.0, 4.0, 6.0]
must_run = ["off", "free", "on"]
residual_cost = 100.0
"#,
    )
    .expect("parse data");
    assert_eq!(data.len(), 3);
    assert_eq!(
        data.must_run.as_deref(),
        Some(&[StatusRequirement::Off, StatusRequirement::Free, StatusRequirement::On][..])
    );
    assert!(data.check_coverage(3).is_ok());
}

#[test]
fn schedule_serializes_to_json() {
    let mut schedule = rhc_core::FullSchedule::new();
    schedule
        .append(rhc_core::ScheduleSegment::new(vec![
            rhc_core::ScheduleEntry::new(0, UnitStatus::On, 4.0),
        ]))
        .unwrap();
    let json = serde_json::to_value(&schedule).unwrap();
    assert_eq!(json["entries"][0]["status"], "on");
    assert_eq!(json["entries"][0]["output"], 4.0);
}
