//! Runtime configuration for the feeder core.
//!
//! These are the structs `FeederCore` consumes. They are separate from the
//! TOML-deserialized config in `feeder_config`; see `conversions`.

use std::time::Duration;

/// Presence hysteresis thresholds.
#[derive(Debug, Clone)]
pub struct PresenceCfg {
    /// Engage when `weight >= on_scale_min_g`.
    pub on_scale_min_g: f64,
    /// Disengage when `weight <= off_scale_max_g`. Must be below `on_scale_min_g`.
    pub off_scale_max_g: f64,
}

impl Default for PresenceCfg {
    fn default() -> Self {
        Self {
            on_scale_min_g: 20.0,
            off_scale_max_g: 8.0,
        }
    }
}

/// Stability window size and allowed range.
#[derive(Debug, Clone)]
pub struct StabilityCfg {
    pub window: usize,
    pub threshold_g: f64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            window: 10,
            threshold_g: 1.0,
        }
    }
}

/// Per-tick averaged read.
#[derive(Debug, Clone)]
pub struct SamplingCfg {
    pub avg_times: u32,
    pub avg_delay: Duration,
    /// Max wait for data-ready on each raw read.
    pub read_timeout: Duration,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            avg_times: 12,
            avg_delay: Duration::from_millis(20),
            read_timeout: Duration::from_millis(500),
        }
    }
}

/// Servo positions and timing around a dispense.
#[derive(Debug, Clone)]
pub struct ServoCfg {
    pub open_angle: f64,
    pub close_angle: f64,
    /// Time each move is driven before the output is released.
    pub settle: Duration,
    /// Floor on the open hold.
    pub min_hold: Duration,
    /// Pause after a dispense before the next tick.
    pub post_feed: Duration,
}

impl Default for ServoCfg {
    fn default() -> Self {
        Self {
            open_angle: 90.0,
            close_angle: 0.0,
            settle: Duration::from_millis(350),
            min_hold: Duration::from_millis(50),
            post_feed: Duration::from_millis(800),
        }
    }
}

/// Display refresh policy.
#[derive(Debug, Clone)]
pub struct DisplayCfg {
    /// IDLE refreshes are skipped until the weight moves by at least this much.
    pub min_refresh_delta_g: f64,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            min_refresh_delta_g: 0.1,
        }
    }
}
