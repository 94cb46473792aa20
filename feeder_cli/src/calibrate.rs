//! Two-step interactive calibration and the `watch` readout.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::{Result, WrapErr};
use feeder_config::{CalibrationFile, Config};
use feeder_core::{CalibrationProfile, WeightReading, read_averaged};
use feeder_traits::{Clock, LoadCell, MonotonicClock};

use crate::hw;

/// Print `msg` and wait for Enter. EOF counts as confirmation so the
/// command can run unattended.
fn confirm(msg: &str) -> Result<()> {
    print!("{msg} Press Enter to continue...");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    println!();
    Ok(())
}

fn averaged(
    cell: &mut dyn LoadCell,
    samples: u32,
    delay: Duration,
    cfg: &Config,
) -> Result<f64> {
    let timeout = Duration::from_millis(cfg.sampling.read_timeout_ms);
    let avg = read_averaged(cell, samples, delay, timeout, &MonotonicClock::new())?;
    Ok(avg)
}

pub struct CalibrateArgs<'a> {
    pub known_grams: f64,
    pub out: &'a Path,
    pub samples: u32,
    pub delay: Duration,
}

pub fn calibrate(
    cfg: &Config,
    args: &CalibrateArgs<'_>,
    json: bool,
) -> Result<CalibrationProfile> {
    if !(args.known_grams.is_finite() && args.known_grams > 0.0) {
        eyre::bail!("--known-grams must be a positive weight");
    }
    let mut cell = hw::calibration_load_cell(cfg, args.known_grams, args.samples)?;

    confirm("Step 1: remove everything from the platform.")?;
    let offset = averaged(cell.as_mut(), args.samples, args.delay, cfg)
        .wrap_err("tare reading")?;
    tracing::info!(offset, samples = args.samples, "tare captured");

    confirm(&format!("Step 2: place {:.1} g on the platform.", args.known_grams))?;
    let loaded = averaged(cell.as_mut(), args.samples, args.delay, cfg)
        .wrap_err("loaded reading")?;
    tracing::info!(loaded, "load captured");

    let profile = CalibrationProfile::from_tare_and_load(offset, loaded, args.known_grams)?;
    let file = CalibrationFile {
        offset: profile.offset(),
        scale: profile.scale(),
        i2c_addr: Some(cfg.display.i2c_addr),
    };
    feeder_config::save_calibration_json(args.out, &file)?;
    tracing::info!(path = %args.out.display(), "calibration saved");

    if json {
        let line = serde_json::json!({
            "offset": profile.offset(),
            "scale": profile.scale(),
            "path": args.out.display().to_string(),
        });
        println!("{line}");
    } else {
        println!(
            "calibration saved to {}: offset={:.2} scale={:.4}",
            args.out.display(),
            profile.offset(),
            profile.scale()
        );
    }
    Ok(profile)
}

/// Averaging used by `watch`: 15 reads, 20 ms apart, every 200 ms.
const WATCH_SAMPLES: u32 = 15;
const WATCH_SAMPLE_DELAY: Duration = Duration::from_millis(20);
const WATCH_PERIOD: Duration = Duration::from_millis(200);

/// Print the weight whenever it moves by at least `deadband_g`.
pub fn watch(
    cfg: &Config,
    calibration: CalibrationProfile,
    deadband_g: f64,
    max_ticks: Option<u64>,
    shutdown: &Arc<AtomicBool>,
) -> Result<u64> {
    let mut cell = hw::load_cell(cfg, &calibration, WATCH_SAMPLES)?;
    let clock = MonotonicClock::new();
    let mut last: Option<f64> = None;
    let mut printed = 0u64;
    let mut ticks = 0u64;

    while !shutdown.load(Ordering::Relaxed) && max_ticks.is_none_or(|m| ticks < m) {
        ticks += 1;
        let avg = averaged(cell.as_mut(), WATCH_SAMPLES, WATCH_SAMPLE_DELAY, cfg)?;
        let reading = WeightReading::from_average(avg, &calibration);
        if last.is_none_or(|prev| (reading.grams - prev).abs() >= deadband_g) {
            println!("Raw_avg = {avg:10.2}  ->  Weight = {:7.1} g", reading.grams);
            last = Some(reading.grams);
            printed += 1;
        }
        clock.sleep(WATCH_PERIOD);
    }
    Ok(printed)
}
