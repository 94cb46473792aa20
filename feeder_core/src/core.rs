//! One control-loop tick (`FeederCore`).
//!
//! A tick is: averaged read, grams, visit machine, optional dispense with
//! its post-feed pause, then the display refresh.

use std::sync::Arc;
use std::time::Duration;

use feeder_traits::{Actuator, Clock, Display, LoadCell};
use tracing::{debug, error, info, warn};

use crate::averager::read_averaged;
use crate::calibration::{CalibrationProfile, WeightReading};
use crate::config::SamplingCfg;
use crate::decision::FeedDecision;
use crate::display::{RefreshGate, SHUTDOWN_BANNER, STARTUP_BANNER, TimestampSource};
use crate::display::{feed_notice, status_lines};
use crate::error::{FeederError, Report, Result};
use crate::machine::VisitMachine;
use crate::sequencer::FeedSequencer;
use crate::stability::StabilityProgress;
use crate::status::VisitState;

/// What a single tick observed and did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub reading: WeightReading,
    pub state: VisitState,
    pub progress: StabilityProgress,
    /// Dispense issued on this tick, if any.
    pub fed: Option<FeedDecision>,
}

/// Unified core, generic over the load cell and the actuator.
pub struct FeederCore<L: LoadCell, A: Actuator> {
    pub(crate) load_cell: L,
    pub(crate) sequencer: FeedSequencer<A>,
    pub(crate) display: Box<dyn Display>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) profile: CalibrationProfile,
    pub(crate) sampling: SamplingCfg,
    pub(crate) machine: VisitMachine,
    pub(crate) gate: RefreshGate,
    pub(crate) timestamp: TimestampSource,
    /// Negative readings at or beyond this magnitude get a wiring warning.
    pub(crate) negative_warn_g: f64,
    pub(crate) feeds: u64,
}

impl<L: LoadCell, A: Actuator> std::fmt::Debug for FeederCore<L, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeederCore")
            .field("profile", &self.profile)
            .field("state", &self.machine.state())
            .field("feeds", &self.feeds)
            .finish()
    }
}

impl<L: LoadCell, A: Actuator> FeederCore<L, A> {
    pub fn state(&self) -> VisitState {
        self.machine.state()
    }

    pub fn calibration(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Successful dispenses since construction.
    pub fn feeds(&self) -> u64 {
        self.feeds
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Averaged raw counts from the load cell using the configured sampling.
    pub fn read_average(&mut self) -> std::result::Result<f64, FeederError> {
        read_averaged(
            &mut self.load_cell,
            self.sampling.avg_times,
            self.sampling.avg_delay,
            self.sampling.read_timeout,
            &*self.clock,
        )
    }

    /// One iteration of the control loop (reads the load cell internally).
    pub fn step(&mut self) -> Result<Tick> {
        let avg = self.read_average().map_err(Report::new)?;
        Ok(self.step_from_average(avg))
    }

    /// Process a pre-averaged raw value.
    pub fn step_from_average(&mut self, averaged_raw: f64) -> Tick {
        let reading = WeightReading::from_average(averaged_raw, &self.profile);
        if reading.is_negative() && reading.grams >= self.negative_warn_g {
            warn!(
                signed_g = reading.signed_g,
                "negative weight beyond engage threshold; check load-cell wiring or calibration sign"
            );
        }

        let step = self.machine.step(reading.grams);
        debug!(
            grams = reading.grams,
            state = step.state.tag(),
            count = step.progress.count,
            span = step.progress.span,
            "tick"
        );
        if let Some(decision) = step.feed {
            self.feed(&decision);
        }
        self.render(reading.grams, step.state, &step.progress);

        Tick {
            reading,
            state: step.state,
            progress: step.progress,
            fed: step.feed,
        }
    }

    fn feed(&mut self, decision: &FeedDecision) {
        let (l1, l2) = feed_notice(decision);
        self.display.write_lines(&l1, &l2);
        info!(
            band = decision.band.label(),
            weight_g = decision.weight_g,
            duration_s = decision.duration_s,
            "dispensing"
        );
        match self.sequencer.dispense(decision.duration_s) {
            Ok(hold) => {
                self.feeds += 1;
                info!(hold_ms = hold.as_millis() as u64, "dispense complete");
            }
            Err(e) => {
                // the visit still counts as fed; never retry a dispense
                warn!(error = %e, "dispense failed; closing gate");
                if let Err(e) = self.sequencer.close() {
                    error!(error = %e, "gate close failed");
                }
            }
        }
        self.clock.sleep(self.sequencer.cfg().post_feed);
    }

    fn render(&mut self, weight_g: f64, state: VisitState, progress: &StabilityProgress) {
        if !self.gate.should_render(weight_g, state) {
            return;
        }
        let stamp = if state == VisitState::Idle {
            (self.timestamp)()
        } else {
            String::new()
        };
        let capacity = self.machine.window().capacity();
        let (l1, l2) = status_lines(weight_g, state, progress, capacity, &stamp);
        if !self.display.write_lines(&l1, &l2) {
            debug!("display refresh dropped");
        }
        self.gate.mark_rendered(weight_g);
    }

    /// Drive the gate closed.
    pub fn close_gate(&mut self) -> std::result::Result<(), FeederError> {
        self.sequencer.close()
    }

    pub fn show_banner(&mut self) {
        self.display.write_lines(STARTUP_BANNER.0, STARTUP_BANNER.1);
    }

    /// Shutdown message, gate closed, message held for `hold`, then the
    /// display blanked. Display writes are best-effort; only the gate can fail.
    pub fn shutdown(&mut self, hold: Duration) -> std::result::Result<(), FeederError> {
        self.display.write_lines(SHUTDOWN_BANNER.0, SHUTDOWN_BANNER.1);
        let closed = self.close_gate();
        self.clock.sleep(hold);
        if !self.display.blank() {
            debug!("display clear dropped");
        }
        closed
    }
}
