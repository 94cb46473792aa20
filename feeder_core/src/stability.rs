//! Bounded stability window over recent weights.

use std::collections::VecDeque;

use crate::util::round_1dp;

/// Snapshot of the window: sample count, whether a full window sits within
/// the threshold, and the window's range (`max - min`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StabilityProgress {
    pub count: usize,
    pub is_stable: bool,
    pub span: f64,
}

/// FIFO of the most recent readings, capacity fixed at construction.
#[derive(Debug, Clone)]
pub struct StabilityWindow {
    buf: VecDeque<f64>,
    capacity: usize,
    threshold_g: f64,
}

impl StabilityWindow {
    pub fn new(capacity: usize, threshold_g: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
            threshold_g,
        }
    }

    /// Append a reading, evicting the oldest once full.
    pub fn push(&mut self, grams: f64) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(grams);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// `max - min` of the window; `0.0` when empty.
    pub fn span(&self) -> f64 {
        let mut it = self.buf.iter().copied();
        let Some(first) = it.next() else {
            return 0.0;
        };
        let (mn, mx) = it.fold((first, first), |(mn, mx), v| (mn.min(v), mx.max(v)));
        mx - mn
    }

    pub fn progress(&self) -> StabilityProgress {
        let span = self.span();
        StabilityProgress {
            count: self.buf.len(),
            is_stable: self.is_full() && span <= self.threshold_g,
            span,
        }
    }

    /// Mean of the window rounded to one decimal; `None` when empty.
    pub fn mean_1dp(&self) -> Option<f64> {
        if self.buf.is_empty() {
            return None;
        }
        let sum: f64 = self.buf.iter().sum();
        Some(round_1dp(sum / self.buf.len() as f64))
    }
}
