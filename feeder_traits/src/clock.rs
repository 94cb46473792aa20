use std::thread;
use std::time::{Duration, Instant};

/// Time source for read timeouts, servo settle/hold and tick pacing.
///
/// Everything that waits goes through `sleep` so tests can run a whole
/// visit on virtual time.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
}

/// Wall-clock implementation backed by `Instant` and `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Default)]
    struct Timeline {
        offset: Duration,
        sleeps: Vec<Duration>,
    }

    /// Virtual clock: `sleep` advances time instantly and is logged.
    ///
    /// Clones share one timeline, so a test can keep a handle while the
    /// code under test owns another.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        timeline: Arc<Mutex<Timeline>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                timeline: Arc::new(Mutex::new(Timeline::default())),
            }
        }

        /// Move time forward without recording a sleep.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut t) = self.timeline.lock() {
                t.offset = t.offset.saturating_add(d);
            }
        }

        /// Virtual time since construction.
        pub fn elapsed(&self) -> Duration {
            self.timeline
                .lock()
                .map(|t| t.offset)
                .unwrap_or(Duration::ZERO)
        }

        /// Every non-zero sleep requested so far, in order.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.timeline
                .lock()
                .map(|t| t.sleeps.clone())
                .unwrap_or_default()
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            if d.is_zero() {
                return;
            }
            if let Ok(mut t) = self.timeline.lock() {
                t.offset = t.offset.saturating_add(d);
                t.sleeps.push(d);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;

    #[test]
    fn sleeps_advance_and_are_logged() {
        let clock = TestClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_millis(350));
        clock.sleep(Duration::ZERO);
        clock.advance(Duration::from_millis(50));
        assert_eq!(clock.now() - start, Duration::from_millis(400));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(350)]);
    }

    #[test]
    fn clones_share_the_same_timeline() {
        let a = TestClock::new();
        let b = a.clone();
        a.sleep(Duration::from_millis(20));
        assert_eq!(b.elapsed(), Duration::from_millis(20));
        assert_eq!(b.sleeps().len(), 1);
    }
}
