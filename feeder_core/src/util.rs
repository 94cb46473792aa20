//! Small numeric helpers shared across the core.

/// Round to one decimal place, exact ties to even.
#[inline]
pub fn round_1dp(x: f64) -> f64 {
    (x * 10.0).round_ties_even() / 10.0
}

/// Seconds to a `Duration` at microsecond resolution; NaN and negatives map to zero.
#[inline]
pub fn secs(s: f64) -> std::time::Duration {
    if s.is_finite() && s > 0.0 {
        std::time::Duration::from_micros((s * 1e6).round() as u64)
    } else {
        std::time::Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_ties_round_to_even() {
        assert_eq!(round_1dp(20.25), 20.2);
        assert_eq!(round_1dp(20.75), 20.8);
        assert_eq!(round_1dp(-0.25), -0.2);
        assert_eq!(round_1dp(12.34), 12.3);
    }

    #[test]
    fn secs_rejects_garbage() {
        assert_eq!(secs(-1.0), std::time::Duration::ZERO);
        assert_eq!(secs(f64::NAN), std::time::Duration::ZERO);
        assert_eq!(secs(0.2), std::time::Duration::from_millis(200));
        assert_eq!(secs(0.3), std::time::Duration::from_millis(300));
    }
}
