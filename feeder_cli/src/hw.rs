//! Hardware assembly: real drivers with feature `hardware`, simulators otherwise.

use eyre::Result;
use feeder_config::Config;
use feeder_core::CalibrationProfile;
use feeder_traits::{Actuator, Display, LoadCell};

/// Comma-separated grams replayed by the simulated load cell, one entry per tick.
#[cfg(not(feature = "hardware"))]
pub const SIM_GRAMS_ENV: &str = "FEEDER_SIM_GRAMS";
/// When set to `1`, the simulated load cell never signals data-ready.
#[cfg(not(feature = "hardware"))]
pub const SIM_STALL_ENV: &str = "FEEDER_SIM_STALL";

#[cfg(not(feature = "hardware"))]
fn sim_script() -> Result<Option<Vec<f64>>> {
    let Ok(raw) = std::env::var(SIM_GRAMS_ENV) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| eyre::eyre!("{SIM_GRAMS_ENV}: invalid grams {s:?}: {e}"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Tare and counts-per-gram of the simulated cell behind `calibrate`.
#[cfg(not(feature = "hardware"))]
const SIM_CAL_OFFSET: f64 = 8000.0;
#[cfg(not(feature = "hardware"))]
const SIM_CAL_SCALE: f64 = 400.0;

#[cfg(feature = "hardware")]
fn open_hx711(cfg: &Config) -> Result<Box<dyn LoadCell>> {
    use eyre::WrapErr;
    let bus = feeder_hardware::RppalHx711Bus::open(cfg.pins.hx711_dt, cfg.pins.hx711_sck)
        .wrap_err("open hx711")?;
    Ok(Box::new(feeder_hardware::Hx711::new(
        bus,
        feeder_hardware::hx711::GAIN_PULSES_A128,
    )))
}

#[cfg(not(feature = "hardware"))]
fn simulated(
    offset: f64,
    scale: f64,
    default_script: Vec<f64>,
    reads_per_step: u32,
) -> Result<Box<dyn LoadCell>> {
    let script = sim_script()?.unwrap_or(default_script);
    tracing::info!(entries = script.len(), "using simulated load cell");
    let mut cell = feeder_hardware::SimulatedLoadCell::new(offset, scale)
        .with_script(script)
        .with_reads_per_step(reads_per_step);
    if std::env::var(SIM_STALL_ENV).is_ok_and(|v| v == "1") {
        cell = cell.stalled();
    }
    Ok(Box::new(cell))
}

/// Load cell for the control loop. `reads_per_step` keeps each simulated
/// script entry alive for one averaged reading.
pub fn load_cell(
    cfg: &Config,
    calibration: &CalibrationProfile,
    reads_per_step: u32,
) -> Result<Box<dyn LoadCell>> {
    #[cfg(feature = "hardware")]
    {
        let _ = (calibration, reads_per_step);
        open_hx711(cfg)
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
        simulated(
            calibration.offset(),
            calibration.scale(),
            Vec::new(),
            reads_per_step,
        )
    }
}

/// Load cell for `calibrate`. The simulator serves an empty platform for
/// the tare step and `known_g` for the load step.
pub fn calibration_load_cell(
    cfg: &Config,
    known_g: f64,
    samples: u32,
) -> Result<Box<dyn LoadCell>> {
    #[cfg(feature = "hardware")]
    {
        let _ = (known_g, samples);
        open_hx711(cfg)
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
        simulated(SIM_CAL_OFFSET, SIM_CAL_SCALE, vec![0.0, known_g], samples)
    }
}

pub fn actuator(cfg: &Config) -> Result<Box<dyn Actuator>> {
    #[cfg(feature = "hardware")]
    {
        use eyre::WrapErr;
        let servo = feeder_hardware::ServoPwm::open(cfg.pins.servo, cfg.servo.pwm_hz)
            .wrap_err("open servo pin")?;
        Ok(Box::new(servo))
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
        Ok(Box::new(feeder_hardware::SimulatedServo::new()))
    }
}

/// Display for this build. `i2c_addr` is the effective address (a calibration
/// file may override `[display]`). LCD failures never abort startup.
pub fn display(cfg: &Config, i2c_addr: u8) -> Box<dyn Display> {
    if !cfg.display.enabled {
        return Box::new(feeder_core::mocks::NullDisplay);
    }
    #[cfg(feature = "hardware")]
    {
        match feeder_hardware::I2cByteBus::open(cfg.display.i2c_bus, i2c_addr) {
            Ok(bus) => {
                let mut lcd = feeder_hardware::Lcd1602::new(
                    bus,
                    feeder_traits::MonotonicClock::new(),
                    cfg.display.retries,
                );
                if let Err(e) = lcd.init() {
                    tracing::warn!(error = %e, "lcd init failed; writes will retry");
                }
                Box::new(lcd)
            }
            Err(e) => {
                tracing::warn!(error = %e, i2c_addr, "lcd unavailable; continuing without display");
                Box::new(feeder_core::mocks::NullDisplay)
            }
        }
    }
    #[cfg(not(feature = "hardware"))]
    {
        tracing::debug!(i2c_addr, "using tracing display");
        Box::new(feeder_hardware::TracingDisplay)
    }
}
