//! Hysteresis presence detection.

/// Change in platform occupancy reported by [`PresenceDetector::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEdge {
    Arrived,
    Left,
}

/// Two-threshold occupancy detector.
///
/// Engages at `weight >= on_min_g` and disengages at `weight <= off_max_g`.
/// Readings strictly between the two never change the current state.
#[derive(Debug, Clone)]
pub struct PresenceDetector {
    on_min_g: f64,
    off_max_g: f64,
    present: bool,
}

impl PresenceDetector {
    /// Thresholds are expected to satisfy `off_max_g < on_min_g`; the builder validates this.
    pub fn new(on_min_g: f64, off_max_g: f64) -> Self {
        Self {
            on_min_g,
            off_max_g,
            present: false,
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn update(&mut self, grams: f64) -> Option<PresenceEdge> {
        if !self.present && grams >= self.on_min_g {
            self.present = true;
            return Some(PresenceEdge::Arrived);
        }
        if self.present && grams <= self.off_max_g {
            self.present = false;
            return Some(PresenceEdge::Left);
        }
        None
    }
}
