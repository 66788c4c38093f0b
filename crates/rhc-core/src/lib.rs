//! # rhc-core: Unit Commitment Data Model
//!
//! Data structures shared by the rolling-horizon scheduler:
//!
//! - [`UnitSpec`]: static description of one dispatchable unit (capacity,
//!   ramp limits, minimum up/down times, tiered startup costs)
//! - [`StateCarrier`]: commitment state passed across window seams
//! - [`DrivingData`]: per-timestep demand and status requirements
//! - [`FullSchedule`]: the stitched per-timestep schedule
//!
//! ## Quick Start
//!
//! ```rust
//! use rhc_core::{StateCarrier, UnitSpec};
//!
//! let unit = UnitSpec::builder()
//!     .name("peaker")
//!     .capacity(2.0, 10.0)
//!     .ramp(5.0, 5.0)
//!     .min_up_down(2, 1)
//!     .hot_warm_cold(1, 1.0, 3, 4.0, 5.0)
//!     .build()
//!     .unwrap();
//!
//! // off for two steps: warm start
//! assert_eq!(unit.startup_cost(2), 4.0);
//!
//! let initial = StateCarrier::offline(2);
//! assert!(initial.validate_against(&unit).is_ok());
//! ```

pub mod carrier;
pub mod error;
pub mod schedule;
pub mod series;
pub mod startup;
pub mod unit;

pub use carrier::{StateCarrier, UnitStatus};
pub use error::{ConfigError, DataAlignmentError, ScheduleError, ScheduleResult};
pub use schedule::{CostTotals, FullSchedule, ScheduleEntry, ScheduleSegment};
pub use series::{DrivingData, StatusRequirement, WindowData};
pub use startup::{classify, hot_warm_cold, startup_cost, StartupTier};
pub use unit::{UnitSpec, UnitSpecBuilder};

/// Tolerance used when comparing outputs against bounds and demand.
pub const FEASIBILITY_TOL: f64 = 1e-6;
