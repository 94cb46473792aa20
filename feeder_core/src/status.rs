//! Visit state reported by each control-loop tick.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
    /// Nothing on the platform.
    #[default]
    Idle,
    /// Subject present; collecting readings until the window settles.
    On,
    /// Window settled this tick; the dispense has been issued.
    Stable,
    /// Already fed this visit; waiting for the subject to step off.
    Fed,
}

impl VisitState {
    pub fn tag(self) -> &'static str {
        match self {
            VisitState::Idle => "IDLE",
            VisitState::On => "ON",
            VisitState::Stable => "STABLE",
            VisitState::Fed => "FED",
        }
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}
