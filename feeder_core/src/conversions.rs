//! `From` implementations bridging `feeder_config` types to `feeder_core` types.

use std::time::Duration;

use crate::config::{DisplayCfg, PresenceCfg, SamplingCfg, ServoCfg, StabilityCfg};
use crate::decision::DecisionTable;

impl From<&feeder_config::PresenceCfg> for PresenceCfg {
    fn from(c: &feeder_config::PresenceCfg) -> Self {
        Self {
            on_scale_min_g: c.on_scale_min_g,
            off_scale_max_g: c.off_scale_max_g,
        }
    }
}

impl From<&feeder_config::StabilityCfg> for StabilityCfg {
    fn from(c: &feeder_config::StabilityCfg) -> Self {
        Self {
            window: c.window,
            threshold_g: c.threshold_g,
        }
    }
}

impl From<&feeder_config::SamplingCfg> for SamplingCfg {
    fn from(c: &feeder_config::SamplingCfg) -> Self {
        Self {
            avg_times: c.avg_times,
            avg_delay: Duration::from_millis(c.avg_delay_ms),
            read_timeout: Duration::from_millis(c.read_timeout_ms),
        }
    }
}

impl From<&feeder_config::ServoCfg> for ServoCfg {
    fn from(c: &feeder_config::ServoCfg) -> Self {
        Self {
            open_angle: c.open_angle,
            close_angle: c.close_angle,
            settle: Duration::from_millis(c.settle_ms),
            min_hold: Duration::from_millis(c.min_hold_ms),
            post_feed: Duration::from_millis(c.post_feed_ms),
        }
    }
}

impl From<&feeder_config::DecisionCfg> for DecisionTable {
    fn from(c: &feeder_config::DecisionCfg) -> Self {
        Self {
            low_g: c.low_g,
            high_g: c.high_g,
            feed_light_s: c.feed_light_s,
            feed_normal_s: c.feed_normal_s,
            feed_heavy_s: c.feed_heavy_s,
        }
    }
}

impl From<&feeder_config::DisplayCfg> for DisplayCfg {
    fn from(c: &feeder_config::DisplayCfg) -> Self {
        Self {
            min_refresh_delta_g: c.min_refresh_delta_g,
        }
    }
}
