//! Maps `Box<dyn Error>` from trait boundaries to typed `FeederError`.
//!
//! The traits in `feeder_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `feeder_hardware::HwError` downcasting.

use crate::error::FeederError;

/// Map a trait-boundary error to a typed `FeederError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> FeederError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<feeder_hardware::HwError>() {
            return if hw.is_timeout() {
                FeederError::Timeout
            } else {
                FeederError::HardwareFault(hw.to_string())
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        FeederError::Timeout
    } else {
        FeederError::Hardware(s)
    }
}
