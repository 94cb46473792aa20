//! Per-visit state machine: presence, stability and the one-shot decision.
//!
//! Pure: no I/O and no timing. `FeederCore` feeds it one weight per tick and
//! carries out the dispense it asks for.

use tracing::info;

use crate::config::{PresenceCfg, StabilityCfg};
use crate::decision::{DecisionTable, FeedDecision};
use crate::presence::{PresenceDetector, PresenceEdge};
use crate::stability::{StabilityProgress, StabilityWindow};
use crate::status::VisitState;

/// Result of one machine step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineStep {
    pub state: VisitState,
    /// Window progress while `On`/`Stable`; zeroed otherwise.
    pub progress: StabilityProgress,
    /// Set only on the tick the window first settles.
    pub feed: Option<FeedDecision>,
}

#[derive(Debug, Clone)]
pub struct VisitMachine {
    presence: PresenceDetector,
    window: StabilityWindow,
    decision: DecisionTable,
    fed_this_visit: bool,
    state: VisitState,
}

impl VisitMachine {
    pub fn new(presence: &PresenceCfg, stability: &StabilityCfg, decision: DecisionTable) -> Self {
        Self {
            presence: PresenceDetector::new(presence.on_scale_min_g, presence.off_scale_max_g),
            window: StabilityWindow::new(stability.window, stability.threshold_g),
            decision,
            fed_this_visit: false,
            state: VisitState::Idle,
        }
    }

    pub fn state(&self) -> VisitState {
        self.state
    }

    pub fn window(&self) -> &StabilityWindow {
        &self.window
    }

    pub fn step(&mut self, grams: f64) -> MachineStep {
        match self.presence.update(grams) {
            Some(PresenceEdge::Arrived) => {
                self.window.clear();
                self.fed_this_visit = false;
                info!(grams, "visit started");
            }
            Some(PresenceEdge::Left) => {
                self.window.clear();
                self.fed_this_visit = false;
                info!(grams, "visit ended");
            }
            None => {}
        }

        let mut progress = StabilityProgress::default();
        let mut feed = None;
        self.state = if !self.presence.is_present() {
            VisitState::Idle
        } else if self.fed_this_visit {
            VisitState::Fed
        } else {
            self.window.push(grams);
            progress = self.window.progress();
            match self.window.mean_1dp() {
                Some(mean) if progress.is_stable => {
                    // decide on the window as it stands now, not on later drift
                    let decision = self.decision.decide(mean);
                    self.fed_this_visit = true;
                    feed = Some(decision);
                    VisitState::Stable
                }
                _ => VisitState::On,
            }
        };

        MachineStep {
            state: self.state,
            progress,
            feed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionBand;

    fn machine() -> VisitMachine {
        VisitMachine::new(
            &PresenceCfg::default(),
            &StabilityCfg::default(),
            DecisionTable::default(),
        )
    }

    #[test]
    fn entry_tick_counts_toward_window() {
        let mut m = machine();
        let s = m.step(50.0);
        assert_eq!(s.state, VisitState::On);
        assert_eq!(s.progress.count, 1);
    }

    #[test]
    fn feeds_once_then_waits_for_step_off() {
        let mut m = machine();
        let mut feeds = Vec::new();
        for _ in 0..15 {
            if let Some(d) = m.step(50.0).feed {
                feeds.push(d);
            }
        }
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].band, DecisionBand::Light);
        assert_eq!(m.state(), VisitState::Fed);

        // still heavy enough to count as present
        assert_eq!(m.step(12.0).state, VisitState::Fed);
        assert_eq!(m.step(8.0).state, VisitState::Idle);
        assert!(m.window().is_empty());
    }

    #[test]
    fn leaving_before_stable_resets_the_window() {
        let mut m = machine();
        for _ in 0..9 {
            m.step(70.0);
        }
        assert_eq!(m.step(2.0).state, VisitState::Idle);
        // a fresh visit needs a full window again
        for _ in 0..9 {
            assert_eq!(m.step(70.0).state, VisitState::On);
        }
        assert_eq!(m.step(70.0).state, VisitState::Stable);
    }
}
