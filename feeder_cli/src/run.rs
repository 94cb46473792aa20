//! Feeder assembly from config and the `run` command.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::Result;
use feeder_config::Config;
use feeder_core::{
    CalibrationProfile, DecisionTable, DisplayCfg, Feeder, PresenceCfg, RunParams, RunSummary,
    SamplingCfg, ServoCfg, StabilityCfg,
};

use crate::hw;

/// Wire config sections and hardware into a ready-to-run feeder.
pub fn build_feeder(
    cfg: &Config,
    calibration: CalibrationProfile,
    display_addr: u8,
) -> Result<Feeder> {
    let sampling: SamplingCfg = (&cfg.sampling).into();
    let load_cell = hw::load_cell(cfg, &calibration, sampling.avg_times)?;
    let actuator = hw::actuator(cfg)?;
    let display = hw::display(cfg, display_addr);

    let presence: PresenceCfg = (&cfg.presence).into();
    let stability: StabilityCfg = (&cfg.stability).into();
    let decision: DecisionTable = (&cfg.decision).into();
    let servo: ServoCfg = (&cfg.servo).into();
    let refresh: DisplayCfg = (&cfg.display).into();

    Feeder::builder()
        .with_load_cell(load_cell)
        .with_actuator(actuator)
        .with_calibration(calibration)
        .with_display(display)
        .with_presence(presence)
        .with_stability(stability)
        .with_decision(decision)
        .with_sampling(sampling)
        .with_servo(servo)
        .with_refresh(refresh)
        .build()
}

pub fn run_params(cfg: &Config, max_ticks: Option<u64>) -> RunParams {
    RunParams {
        max_ticks,
        banner_hold: Duration::from_millis(cfg.display.banner_hold_ms),
        shutdown_hold: Duration::from_millis(cfg.display.shutdown_hold_ms),
        ..RunParams::from(&cfg.sampling)
    }
}

pub fn run_feeder(
    cfg: &Config,
    calibration: CalibrationProfile,
    display_addr: u8,
    max_ticks: Option<u64>,
    shutdown: &Arc<AtomicBool>,
) -> Result<RunSummary> {
    let mut feeder = build_feeder(cfg, calibration, display_addr)?;
    tracing::info!(
        offset = calibration.offset(),
        scale = calibration.scale(),
        "feeder ready"
    );
    feeder_core::run(&mut feeder, &run_params(cfg, max_ticks), shutdown)
}

pub fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        let line = serde_json::json!({
            "ticks": summary.ticks,
            "feeds": summary.feeds,
            "stalls": summary.stalls,
        });
        println!("{line}");
    } else {
        println!(
            "run complete: ticks={} feeds={} stalls={}",
            summary.ticks, summary.feeds, summary.stalls
        );
    }
}
