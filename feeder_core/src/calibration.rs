//! Raw-count to grams mapping.

use crate::error::FeederError;
use crate::util::round_1dp;

/// Linear load-cell model: `grams = (raw - offset) / scale`.
///
/// Constructed once at startup and never mutated; `scale` is guaranteed
/// finite and non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    offset: f64,
    scale: f64,
}

impl CalibrationProfile {
    pub fn new(offset: f64, scale: f64) -> Result<Self, FeederError> {
        if !offset.is_finite() {
            return Err(FeederError::Config("calibration offset must be finite".into()));
        }
        if !scale.is_finite() || scale == 0.0 {
            return Err(FeederError::Config(
                "calibration scale must be finite and non-zero".into(),
            ));
        }
        Ok(Self { offset, scale })
    }

    /// Two-point calibration from a tare reading and a reading under `known_g` grams.
    pub fn from_tare_and_load(
        offset: f64,
        loaded_raw: f64,
        known_g: f64,
    ) -> Result<Self, FeederError> {
        if !(known_g.is_finite() && known_g > 0.0) {
            return Err(FeederError::Config("known weight must be > 0 g".into()));
        }
        let scale = (loaded_raw - offset) / known_g;
        if scale == 0.0 {
            return Err(FeederError::Config(
                "loaded reading equals tare; is the weight on the platform?".into(),
            ));
        }
        Self::new(offset, scale)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Averaged raw counts to grams, rounded to one decimal place (signed).
    #[inline]
    pub fn to_grams(&self, averaged_raw: f64) -> f64 {
        round_1dp((averaged_raw - self.offset) / self.scale)
    }

    /// Inverse mapping, used by simulators and round-trip checks.
    #[inline]
    pub fn to_raw(&self, grams: f64) -> f64 {
        grams * self.scale + self.offset
    }
}

impl TryFrom<&feeder_config::CalibrationCfg> for CalibrationProfile {
    type Error = FeederError;
    fn try_from(c: &feeder_config::CalibrationCfg) -> Result<Self, Self::Error> {
        Self::new(c.offset, c.scale)
    }
}

/// One tick's weight. `grams` is the magnitude the state machine acts on;
/// `signed_g` keeps the sign so a reversed or miswired cell stays visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightReading {
    pub signed_g: f64,
    pub grams: f64,
}

impl WeightReading {
    pub fn from_average(averaged_raw: f64, profile: &CalibrationProfile) -> Self {
        let signed_g = profile.to_grams(averaged_raw);
        Self {
            signed_g,
            grams: signed_g.abs(),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.signed_g < 0.0
    }
}
