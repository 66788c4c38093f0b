//! # rhc-algo: Rolling-Horizon Unit Commitment
//!
//! Schedules one dispatchable unit over a long horizon by solving a sequence
//! of overlapping windows and stitching their authoritative portions.
//!
//! | Module | Role |
//! |--------|------|
//! | [`horizon`] | Splits `[0, H)` into windows with look-ahead |
//! | [`commitment`] | Window formulation, solver backends, window adapter |
//! | [`rolling`] | Orchestrator state machine |
//!
//! ## Backends
//!
//! | Backend | Method | Notes |
//! |---------|--------|-------|
//! | [`DynamicProgrammingBackend`] | Forward DP over status, dwell and output | Exact when the unit must meet demand |
//! | [`MilpBackend`] | Three-binary MILP via `good_lp` | Needs `solver-microlp` (default) or `solver-highs` |
//!
//! ## Example
//!
//! ```rust
//! use rhc_algo::{DynamicProgrammingBackend, RollingConfig, RollingHorizon};
//! use rhc_core::{DrivingData, StateCarrier, UnitSpec};
//!
//! let unit = UnitSpec::builder()
//!     .capacity(2.0, 10.0)
//!     .ramp(5.0, 5.0)
//!     .min_up_down(2, 1)
//!     .hot_warm_cold(1, 1.0, 3, 4.0, 5.0)
//!     .build()
//!     .unwrap();
//! let data = DrivingData::new(vec![0.0, 4.0, 6.0, 8.0, 8.0, 5.0]);
//! let backend = DynamicProgrammingBackend::default();
//!
//! let outcome = RollingHorizon::new(&unit, &data, RollingConfig::new(3, 0), &backend)
//!     .run(StateCarrier::online(2, 2.0));
//! let schedule = outcome.into_result().unwrap();
//! assert_eq!(schedule.total_startup_cost(), 1.0);
//! ```

pub mod commitment;
pub mod horizon;
pub mod rolling;

#[cfg(any(feature = "solver-microlp", feature = "solver-highs"))]
pub use commitment::MilpBackend;
pub use commitment::{
    Assignment, BackendKind, CommitmentBackend, CommitmentFormulation, DynamicProgrammingBackend,
    SolveFailure, WindowSolution, WindowSolverAdapter,
};
pub use horizon::{HorizonPartitioner, Window, WindowSpan};
pub use rolling::{Phase, RollingConfig, RollingHorizon, RollingOutcome, WindowReport};
