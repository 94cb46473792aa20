//! Line-level timing helpers for the bit-banged HX711 driver.

use std::time::Duration;

use feeder_traits::Clock;

use crate::error::{HwError, Result};

/// Wait for the HX711 to pull DOUT low, polling `is_high` against `clock`.
///
/// Returns the number of polls that saw the line still high, or
/// `HwError::DataReadyTimeout` once `timeout` has passed. A zero `poll`
/// spins between checks instead of sleeping.
pub fn wait_for_data_ready<C: Clock + ?Sized>(
    clock: &C,
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll: Duration,
) -> Result<u32> {
    let deadline = clock.now() + timeout;
    let mut busy = 0u32;
    while is_high() {
        if clock.now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        busy = busy.saturating_add(1);
        if poll.is_zero() {
            std::hint::spin_loop();
        } else {
            clock.sleep(poll);
        }
    }
    Ok(busy)
}

/// Pause between PD_SCK edges. Holding the clock high past 60 us powers the
/// chip down, so this spins rather than sleeps.
#[inline(always)]
pub fn edge_delay() {
    for _ in 0..4 {
        std::hint::spin_loop();
    }
}
