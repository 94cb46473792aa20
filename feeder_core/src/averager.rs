//! Multi-read averaging of the load cell.

use std::time::Duration;

use feeder_traits::{Clock, LoadCell};

use crate::error::FeederError;
use crate::hw_error::map_hw_error;

/// Read the load cell `times` times and return the arithmetic mean of the raw
/// counts. `delay` is slept between reads (not after the last one); each read
/// waits at most `timeout` for data-ready.
///
/// `times == 0` is treated as 1. Raw counts are summed in `i64` so the mean
/// is exact for any realistic `times`.
pub fn read_averaged<L, C>(
    load_cell: &mut L,
    times: u32,
    delay: Duration,
    timeout: Duration,
    clock: &C,
) -> Result<f64, FeederError>
where
    L: LoadCell + ?Sized,
    C: Clock + ?Sized,
{
    let n = times.max(1);
    let mut total: i64 = 0;
    for i in 0..n {
        if i > 0 {
            clock.sleep(delay);
        }
        let raw = load_cell
            .read(timeout)
            .map_err(|e| map_hw_error(e.as_ref()))?;
        total += i64::from(raw);
    }
    let mean = total as f64 / f64::from(n);
    tracing::trace!(times = n, mean, "averaged read");
    Ok(mean)
}
