//! Type-state builder for `Feeder`.
//!
//! The builder enforces at compile time that a load cell, an actuator and a
//! calibration are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use feeder_traits::clock::{Clock, MonotonicClock};
use feeder_traits::{Actuator, Display, LoadCell};

use crate::calibration::CalibrationProfile;
use crate::config::*;
use crate::core::{FeederCore, Tick};
use crate::decision::DecisionTable;
use crate::display::{RefreshGate, TimestampSource, local_timestamp};
use crate::error::{BuildError, FeederError, Result};
use crate::machine::VisitMachine;
use crate::mocks::NullDisplay;
use crate::sequencer::FeedSequencer;
use crate::status::VisitState;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Boxed feeder used by the CLI; wraps the generic core.
pub struct Feeder {
    pub(crate) inner: FeederCore<Box<dyn LoadCell>, Box<dyn Actuator>>,
}

impl std::fmt::Debug for Feeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

impl Feeder {
    pub fn builder() -> FeederBuilder<Missing, Missing, Missing> {
        FeederBuilder::default()
    }

    pub fn step(&mut self) -> Result<Tick> {
        self.inner.step()
    }

    pub fn step_from_average(&mut self, averaged_raw: f64) -> Tick {
        self.inner.step_from_average(averaged_raw)
    }

    pub fn read_average(&mut self) -> std::result::Result<f64, FeederError> {
        self.inner.read_average()
    }

    pub fn state(&self) -> VisitState {
        self.inner.state()
    }

    pub fn feeds(&self) -> u64 {
        self.inner.feeds()
    }

    pub fn calibration(&self) -> &CalibrationProfile {
        self.inner.calibration()
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        self.inner.clock()
    }

    pub fn close_gate(&mut self) -> std::result::Result<(), FeederError> {
        self.inner.close_gate()
    }

    pub fn show_banner(&mut self) {
        self.inner.show_banner();
    }

    pub fn shutdown(&mut self, hold: Duration) -> std::result::Result<(), FeederError> {
        self.inner.shutdown(hold)
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Feeder`. All fields are validated on `build()`.
pub struct FeederBuilder<L, A, C> {
    load_cell: Option<Box<dyn LoadCell>>,
    actuator: Option<Box<dyn Actuator>>,
    calibration: Option<CalibrationProfile>,
    display: Option<Box<dyn Display>>,
    presence: Option<PresenceCfg>,
    stability: Option<StabilityCfg>,
    decision: Option<DecisionTable>,
    sampling: Option<SamplingCfg>,
    servo: Option<ServoCfg>,
    refresh: Option<DisplayCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    timestamp: Option<TimestampSource>,
    _l: PhantomData<L>,
    _a: PhantomData<A>,
    _c: PhantomData<C>,
}

impl Default for FeederBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            load_cell: None,
            actuator: None,
            calibration: None,
            display: None,
            presence: None,
            stability: None,
            decision: None,
            sampling: None,
            servo: None,
            refresh: None,
            clock: None,
            timestamp: None,
            _l: PhantomData,
            _a: PhantomData,
            _c: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn check_finite_secs(s: f64, msg: &'static str) -> Result<()> {
    if s.is_finite() && s >= 0.0 {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

/// Validate configuration and construct a `FeederCore`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<L: LoadCell, A: Actuator>(
    load_cell: L,
    actuator: A,
    calibration: CalibrationProfile,
    display: Box<dyn Display>,
    presence: PresenceCfg,
    stability: StabilityCfg,
    decision: DecisionTable,
    sampling: SamplingCfg,
    servo: ServoCfg,
    refresh: DisplayCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    timestamp: TimestampSource,
) -> Result<FeederCore<L, A>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if !(presence.on_scale_min_g.is_finite() && presence.off_scale_max_g.is_finite()) {
        return Err(invalid("presence thresholds must be finite"));
    }
    if presence.off_scale_max_g >= presence.on_scale_min_g {
        return Err(invalid("off_scale_max_g must be < on_scale_min_g"));
    }
    if stability.window == 0 {
        return Err(invalid("stability window must be >= 1"));
    }
    if !(stability.threshold_g.is_finite() && stability.threshold_g >= 0.0) {
        return Err(invalid("stability threshold_g must be >= 0"));
    }
    if !(decision.low_g.is_finite() && decision.high_g.is_finite()) {
        return Err(invalid("decision thresholds must be finite"));
    }
    if decision.low_g >= decision.high_g {
        return Err(invalid("low_g must be < high_g"));
    }
    check_finite_secs(decision.feed_light_s, "feed_light_s must be >= 0")?;
    check_finite_secs(decision.feed_normal_s, "feed_normal_s must be >= 0")?;
    check_finite_secs(decision.feed_heavy_s, "feed_heavy_s must be >= 0")?;
    if sampling.avg_times == 0 {
        return Err(invalid("avg_times must be >= 1"));
    }
    if sampling.read_timeout.is_zero() {
        return Err(invalid("read_timeout must be > 0"));
    }
    for angle in [servo.open_angle, servo.close_angle] {
        if !(0.0..=180.0).contains(&angle) {
            return Err(invalid("servo angles must be within 0..=180"));
        }
    }
    if !(refresh.min_refresh_delta_g.is_finite() && refresh.min_refresh_delta_g >= 0.0) {
        return Err(invalid("min_refresh_delta_g must be >= 0"));
    }

    // ── Assemble ─────────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let negative_warn_g = presence.on_scale_min_g;
    let machine = VisitMachine::new(&presence, &stability, decision);

    Ok(FeederCore {
        load_cell,
        sequencer: FeedSequencer::new(actuator, servo, clock.clone()),
        display,
        clock,
        profile: calibration,
        sampling,
        machine,
        gate: RefreshGate::new(refresh.min_refresh_delta_g),
        timestamp,
        negative_warn_g,
        feeds: 0,
    })
}

impl<L, A, C> FeederBuilder<L, A, C> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Feeder> {
        let load_cell = self
            .load_cell
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLoadCell))?;
        let actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let calibration = self
            .calibration
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCalibration))?;

        let inner = validate_and_build(
            load_cell,
            actuator,
            calibration,
            self.display.unwrap_or_else(|| Box::new(NullDisplay)),
            self.presence.unwrap_or_default(),
            self.stability.unwrap_or_default(),
            self.decision.unwrap_or_default(),
            self.sampling.unwrap_or_default(),
            self.servo.unwrap_or_default(),
            self.refresh.unwrap_or_default(),
            self.clock,
            self.timestamp.unwrap_or_else(|| Box::new(local_timestamp)),
        )?;

        Ok(Feeder { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<L, A, C> FeederBuilder<L, A, C> {
    pub fn with_display(mut self, display: impl Display + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }
    pub fn with_presence(mut self, presence: PresenceCfg) -> Self {
        self.presence = Some(presence);
        self
    }
    pub fn with_stability(mut self, stability: StabilityCfg) -> Self {
        self.stability = Some(stability);
        self
    }
    pub fn with_decision(mut self, decision: DecisionTable) -> Self {
        self.decision = Some(decision);
        self
    }
    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.sampling = Some(sampling);
        self
    }
    pub fn with_servo(mut self, servo: ServoCfg) -> Self {
        self.servo = Some(servo);
        self
    }
    pub fn with_refresh(mut self, refresh: DisplayCfg) -> Self {
        self.refresh = Some(refresh);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Override the IDLE timestamp line; defaults to local time.
    pub fn with_timestamp_source<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + 'static,
    {
        self.timestamp = Some(Box::new(f));
        self
    }
}

// Setters that advance type-state
impl<A, C> FeederBuilder<Missing, A, C> {
    pub fn with_load_cell(self, load_cell: impl LoadCell + 'static) -> FeederBuilder<Set, A, C> {
        FeederBuilder {
            load_cell: Some(Box::new(load_cell)),
            actuator: self.actuator,
            calibration: self.calibration,
            display: self.display,
            presence: self.presence,
            stability: self.stability,
            decision: self.decision,
            sampling: self.sampling,
            servo: self.servo,
            refresh: self.refresh,
            clock: self.clock,
            timestamp: self.timestamp,
            _l: PhantomData,
            _a: PhantomData,
            _c: PhantomData,
        }
    }
}

impl<L, C> FeederBuilder<L, Missing, C> {
    pub fn with_actuator(self, actuator: impl Actuator + 'static) -> FeederBuilder<L, Set, C> {
        FeederBuilder {
            load_cell: self.load_cell,
            actuator: Some(Box::new(actuator)),
            calibration: self.calibration,
            display: self.display,
            presence: self.presence,
            stability: self.stability,
            decision: self.decision,
            sampling: self.sampling,
            servo: self.servo,
            refresh: self.refresh,
            clock: self.clock,
            timestamp: self.timestamp,
            _l: PhantomData,
            _a: PhantomData,
            _c: PhantomData,
        }
    }
}

impl<L, A> FeederBuilder<L, A, Missing> {
    pub fn with_calibration(self, calibration: CalibrationProfile) -> FeederBuilder<L, A, Set> {
        FeederBuilder {
            load_cell: self.load_cell,
            actuator: self.actuator,
            calibration: Some(calibration),
            display: self.display,
            presence: self.presence,
            stability: self.stability,
            decision: self.decision,
            sampling: self.sampling,
            servo: self.servo,
            refresh: self.refresh,
            clock: self.clock,
            timestamp: self.timestamp,
            _l: PhantomData,
            _a: PhantomData,
            _c: PhantomData,
        }
    }
}

impl FeederBuilder<Set, Set, Set> {
    /// Validate and build the Feeder. Only available when all three parts are set.
    pub fn build(self) -> Result<Feeder> {
        self.try_build()
    }
}
