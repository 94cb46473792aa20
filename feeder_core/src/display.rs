//! Two-line status rendering and the refresh gate.

use crate::decision::FeedDecision;
use crate::stability::StabilityProgress;
use crate::status::VisitState;

pub const STARTUP_BANNER: (&str, &str) = ("Pet Feeder", "On+Stable Mode");
pub const SHUTDOWN_BANNER: (&str, &str) = ("Stopped", "Shutdown OK");
pub const FED_LINE: &str = "Done. step off!";

/// Wall-clock label for the IDLE second line.
pub type TimestampSource = Box<dyn Fn() -> String>;

/// Local time as `MM/DD HH:MM:SS`.
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%m/%d %H:%M:%S").to_string()
}

/// Status lines for one tick.
///
/// Line 2 depends on the state: window progress while collecting, an
/// acknowledgement once fed, otherwise the timestamp.
pub fn status_lines(
    weight_g: f64,
    state: VisitState,
    progress: &StabilityProgress,
    window_capacity: usize,
    timestamp: &str,
) -> (String, String) {
    let line1 = format!("W:{:7.1}g {:>4}", weight_g, state.tag());
    let line2 = match state {
        VisitState::On | VisitState::Stable => format!(
            "S:{:2}/{} d{:3.1}",
            progress.count, window_capacity, progress.span
        ),
        VisitState::Fed => FED_LINE.to_string(),
        VisitState::Idle => timestamp.to_string(),
    };
    (line1, line2)
}

/// Lines shown just before a dispense.
pub fn feed_notice(decision: &FeedDecision) -> (String, String) {
    (
        format!("W:{:6.1}g {:>5}", decision.weight_g, decision.band.label()),
        format!("Feed {:.2}s...", decision.duration_s),
    )
}

/// Limits display churn while idle.
#[derive(Debug, Clone)]
pub struct RefreshGate {
    min_delta_g: f64,
    last_weight: Option<f64>,
}

impl RefreshGate {
    pub fn new(min_delta_g: f64) -> Self {
        Self {
            min_delta_g,
            last_weight: None,
        }
    }

    /// Render on the first tick, whenever the state is not IDLE, or when
    /// the weight moved by at least `min_delta_g` since the last render.
    pub fn should_render(&self, weight_g: f64, state: VisitState) -> bool {
        match self.last_weight {
            None => true,
            Some(_) if state != VisitState::Idle => true,
            // tolerate binary noise on one-decimal values (0.3 - 0.2 < 0.1)
            Some(last) => (weight_g - last).abs() + 1e-9 >= self.min_delta_g,
        }
    }

    pub fn mark_rendered(&mut self, weight_g: f64) {
        self.last_weight = Some(weight_g);
    }
}
