use std::path::Path;

use anyhow::Result;
use rhc_core::startup::tier_label;

use crate::scenario::Scenario;

pub fn handle(scenario_path: &Path) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let partitioner = scenario.validate()?;
    let kind = scenario.backend_kind(None)?;

    let unit = &scenario.unit;
    println!("Scenario OK: {}", scenario_path.display());
    println!(
        "  Unit {}: capacity [{}, {}], ramp +{}/-{}, min up/down {}/{}",
        unit.name,
        unit.capacity_min,
        unit.capacity_max,
        unit.ramp_up_limit,
        unit.ramp_down_limit,
        unit.min_uptime,
        unit.min_downtime
    );
    let tier_count = unit.startup_tiers.len();
    for (i, tier) in unit.startup_tiers.iter().enumerate() {
        let reach = tier
            .max_off_duration
            .map(|b| format!("off <= {b}"))
            .unwrap_or_else(|| "any off duration".to_string());
        println!("  {} start: {} ({reach})", tier_label(i, tier_count), tier.cost);
    }
    println!(
        "  Horizon: {} timesteps in {} window(s) of {} (look-ahead {})",
        partitioner.horizon(),
        partitioner.window_count(),
        scenario.horizon.window_length,
        scenario.horizon.look_ahead
    );
    println!("  Initial state: {}", scenario.initial);
    println!("  Backend: {kind}");
    Ok(())
}
