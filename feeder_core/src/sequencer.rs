//! Open, hold, close actuation cycle.

use std::sync::Arc;
use std::time::Duration;

use feeder_traits::{Actuator, Clock};
use tracing::debug;

use crate::config::ServoCfg;
use crate::error::FeederError;
use crate::hw_error::map_hw_error;
use crate::util::secs;

/// Duty (percent) for a 50 Hz hobby servo: 0 deg = 2 %, 180 deg = 12 %.
#[inline]
pub fn duty_for_angle(angle_deg: f64) -> f64 {
    2.0 + angle_deg / 18.0
}

/// Drives the gate actuator. Every move is held for `settle` and then the
/// output is released so the servo does not buzz against the stop.
pub struct FeedSequencer<A: Actuator> {
    actuator: A,
    cfg: ServoCfg,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<A: Actuator> FeedSequencer<A> {
    pub fn new(actuator: A, cfg: ServoCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            actuator,
            cfg,
            clock,
        }
    }

    pub fn cfg(&self) -> &ServoCfg {
        &self.cfg
    }

    pub fn move_to(&mut self, angle_deg: f64) -> Result<(), FeederError> {
        let duty = duty_for_angle(angle_deg);
        debug!(angle_deg, duty, "servo move");
        self.actuator
            .set_duty(duty)
            .map_err(|e| map_hw_error(e.as_ref()))?;
        self.clock.sleep(self.cfg.settle);
        self.actuator
            .set_duty(0.0)
            .map_err(|e| map_hw_error(e.as_ref()))
    }

    pub fn close(&mut self) -> Result<(), FeederError> {
        self.move_to(self.cfg.close_angle)
    }

    /// One full cycle; returns the hold actually applied (`max(min_hold, duration_s)`).
    pub fn dispense(&mut self, duration_s: f64) -> Result<Duration, FeederError> {
        let hold = secs(duration_s).max(self.cfg.min_hold);
        self.move_to(self.cfg.open_angle)?;
        self.clock.sleep(hold);
        self.close()?;
        Ok(hold)
    }
}
