//! Weight band to dispense duration.

use std::fmt;
use std::time::Duration;

use crate::util::secs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionBand {
    Light,
    Ok,
    Heavy,
}

impl DecisionBand {
    pub fn label(self) -> &'static str {
        match self {
            DecisionBand::Light => "LIGHT",
            DecisionBand::Ok => "OK",
            DecisionBand::Heavy => "HEAVY",
        }
    }
}

impl fmt::Display for DecisionBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width specifiers like {:>5} apply
        f.pad(self.label())
    }
}

/// Outcome of one decision: the band, the weight it was made on, and the dispense time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedDecision {
    pub band: DecisionBand,
    pub weight_g: f64,
    pub duration_s: f64,
}

impl FeedDecision {
    pub fn duration(&self) -> Duration {
        secs(self.duration_s)
    }
}

/// Lighter subjects get the longer portion. Both bounds are strict, so
/// `low_g` and `high_g` themselves fall in `Ok`.
#[derive(Debug, Clone)]
pub struct DecisionTable {
    pub low_g: f64,
    pub high_g: f64,
    pub feed_light_s: f64,
    pub feed_normal_s: f64,
    pub feed_heavy_s: f64,
}

impl Default for DecisionTable {
    fn default() -> Self {
        Self {
            low_g: 60.0,
            high_g: 90.0,
            feed_light_s: 0.30,
            feed_normal_s: 0.20,
            feed_heavy_s: 0.10,
        }
    }
}

impl DecisionTable {
    pub fn decide(&self, weight_g: f64) -> FeedDecision {
        let (band, duration_s) = if weight_g < self.low_g {
            (DecisionBand::Light, self.feed_light_s)
        } else if weight_g > self.high_g {
            (DecisionBand::Heavy, self.feed_heavy_s)
        } else {
            (DecisionBand::Ok, self.feed_normal_s)
        };
        FeedDecision {
            band,
            weight_g,
            duration_s,
        }
    }
}
