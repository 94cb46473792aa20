#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core feeder logic (hardware-agnostic).
//!
//! All hardware goes through `feeder_traits::{LoadCell, Actuator, Display}`.
//!
//! ## Architecture
//!
//! - **Acquisition**: multi-read averaging (`averager`) and the linear
//!   raw-to-grams model (`calibration`)
//! - **Visit logic**: hysteresis presence (`presence`), range-over-window
//!   stability (`stability`), weight bands (`decision`), tied together by
//!   the pure `machine::VisitMachine`
//! - **Actuation**: open/hold/close cycle (`sequencer`)
//! - **Loop**: `FeederCore` runs one tick; `runner::run` paces ticks and
//!   handles stalls and shutdown
//!
//! Weights are `f64` grams rounded to one decimal, matching what the display shows.

pub mod averager;
pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod core;
pub mod decision;
pub mod display;
pub mod error;
pub mod hw_error;
pub mod machine;
pub mod mocks;
pub mod presence;
pub mod runner;
pub mod sequencer;
pub mod stability;
pub mod status;
pub mod util;

pub use averager::read_averaged;
pub use builder::{Feeder, FeederBuilder, Missing, Set};
pub use calibration::{CalibrationProfile, WeightReading};
pub use config::{DisplayCfg, PresenceCfg, SamplingCfg, ServoCfg, StabilityCfg};
pub use self::core::{FeederCore, Tick};
pub use decision::{DecisionBand, DecisionTable, FeedDecision};
pub use display::{RefreshGate, feed_notice, local_timestamp, status_lines};
pub use machine::{MachineStep, VisitMachine};
pub use presence::{PresenceDetector, PresenceEdge};
pub use runner::{RunParams, RunSummary, run};
pub use sequencer::{FeedSequencer, duty_for_angle};
pub use stability::{StabilityProgress, StabilityWindow};
pub use status::VisitState;
