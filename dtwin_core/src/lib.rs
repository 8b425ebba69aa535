#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Digital-twin simulation engine for a semi-continuous distillation train.
//!
//! This crate is the hardware/transport-agnostic core: a plant model built
//! from deviation-form FOPDT blocks, six PI loops with bumpless re-tracking,
//! a hysteretic product/recycle quality gate, a fixed-order safety-interlock
//! table, and the fixed-step scheduler that drives all four in lockstep.
//!
//! ## Architecture
//!
//! - **FopdtBlock** (`fopdt`): first-order lag with pure transport delay.
//! - **PiController** (`pi`): saturating PI with back-calculation anti-windup.
//! - **PlantModel** (`plant`): the seven-block process plus its algebraic couplings.
//! - **QualityGate** (`gate`): two-state hysteretic routing decision.
//! - **InterlockTable** (`interlock`): fixed-order safety overrides.
//! - **Scheduler** (`scheduler`): owns one run's plant/controllers/gate/interlocks.
//! - **Metrics** (`metrics`): per-loop IAE/ITAE/overshoot/settling-time, gate stats.
//! - **SuiteDriver** (`suite`): fixed ten-scenario regression batch.
//!
//! `dtwin_config` builds a [`scenario::Scenario`] from the external request and
//! converts this crate's [`trace::Trace`]/[`metrics::LoopMetrics`] into the
//! wire-format types in `response`.

pub mod error;
pub mod fopdt;
pub mod gate;
pub mod interlock;
pub mod metrics;
pub mod pi;
pub mod plant;
pub mod response;
pub mod rng;
pub mod scenario;
pub mod scheduler;
pub mod suite;
pub mod trace;
