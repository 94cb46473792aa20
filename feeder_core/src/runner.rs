//! Control loop driver: ticks, tick pacing, stall accounting and shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::builder::Feeder;
use crate::error::{FeederError, Report, Result};

/// Loop parameters that are not part of the feeder itself.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Pause between ticks.
    pub tick: Duration,
    /// Stop after this many ticks (`None` = until shutdown).
    pub max_ticks: Option<u64>,
    /// Abort after this many consecutive timed-out ticks (0 = never).
    pub max_consecutive_stalls: u32,
    /// How long the startup banner stays up before the first tick.
    pub banner_hold: Duration,
    /// How long the shutdown message stays up before the display is cleared.
    pub shutdown_hold: Duration,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(150),
            max_ticks: None,
            max_consecutive_stalls: 20,
            banner_hold: Duration::from_secs(1),
            shutdown_hold: Duration::from_millis(600),
        }
    }
}

impl From<&feeder_config::SamplingCfg> for RunParams {
    fn from(c: &feeder_config::SamplingCfg) -> Self {
        Self {
            tick: Duration::from_millis(c.tick_ms),
            max_consecutive_stalls: c.max_consecutive_stalls,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub feeds: u64,
    /// Ticks lost to load-cell timeouts.
    pub stalls: u64,
}

#[inline]
fn is_timeout(e: &Report) -> bool {
    e.downcast_ref::<FeederError>().is_some_and(FeederError::is_timeout)
}

/// Run the control loop until `shutdown` is set, `max_ticks` is reached, or
/// an unrecoverable error occurs. The gate is driven closed on every exit path.
pub fn run(feeder: &mut Feeder, params: &RunParams, shutdown: &AtomicBool) -> Result<RunSummary> {
    // start from a known gate position; a dead actuator is fatal here
    feeder.close_gate().map_err(Report::new)?;
    feeder.show_banner();
    feeder.clock().sleep(params.banner_hold);

    let result = run_loop(feeder, params, shutdown);

    if let Err(e) = feeder.shutdown(params.shutdown_hold) {
        tracing::error!(error = %e, "failed to close gate on exit");
    }
    match &result {
        Ok(summary) => tracing::info!(
            ticks = summary.ticks,
            feeds = summary.feeds,
            stalls = summary.stalls,
            "run complete"
        ),
        Err(e) => tracing::error!(error = %e, "run aborted"),
    }
    result
}

fn run_loop(feeder: &mut Feeder, params: &RunParams, shutdown: &AtomicBool) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut stalls_in_row: u32 = 0;
    tracing::info!(
        tick_ms = params.tick.as_millis() as u64,
        max_ticks = ?params.max_ticks,
        "run start"
    );

    while !shutdown.load(Ordering::Relaxed) {
        if params.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        summary.ticks += 1;

        match feeder.step() {
            Ok(_) => stalls_in_row = 0,
            Err(e) if is_timeout(&e) => {
                summary.stalls += 1;
                stalls_in_row = stalls_in_row.saturating_add(1);
                tracing::warn!(consecutive = stalls_in_row, "load cell read timed out");
                if params.max_consecutive_stalls > 0
                    && stalls_in_row >= params.max_consecutive_stalls
                {
                    return Err(e.wrap_err(format!(
                        "load cell stalled for {stalls_in_row} consecutive ticks"
                    )));
                }
            }
            Err(e) => return Err(e),
        }

        summary.feeds = feeder.feeds();
        feeder.clock().sleep(params.tick);
    }

    if shutdown.load(Ordering::Relaxed) {
        tracing::info!("shutdown requested");
    }
    Ok(summary)
}
