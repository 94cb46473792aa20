mod calibrate;
mod cli;
mod error_fmt;
mod hw;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use feeder_config::Config;
use feeder_core::CalibrationProfile;
use feeder_core::error::{BuildError, FeederError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::calibrate::CalibrateArgs;
use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %format!("{err:#}"), "feeder exited with error");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match &cli.cmd {
        Commands::Run { max_ticks } => {
            let (calibration, addr) = resolve_calibration(&cli, &cfg)?;
            let summary = run::run_feeder(&cfg, calibration, addr, *max_ticks, &shutdown)?;
            run::print_summary(&summary, cli.json);
        }
        Commands::Calibrate {
            known_grams,
            out,
            samples,
            delay_ms,
        } => {
            let args = CalibrateArgs {
                known_grams: *known_grams,
                out,
                samples: *samples,
                delay: Duration::from_millis(*delay_ms),
            };
            calibrate::calibrate(&cfg, &args, cli.json)?;
        }
        Commands::Watch {
            deadband_g,
            max_ticks,
        } => {
            let (calibration, _) = resolve_calibration(&cli, &cfg)?;
            calibrate::watch(&cfg, calibration, *deadband_g, *max_ticks, &shutdown)?;
        }
        Commands::SelfCheck => self_check(&cli, &cfg)?,
    }
    Ok(())
}

/// Missing file means built-in defaults; anything unreadable or invalid is a config error.
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| FeederError::Config(format!("read {}: {e}", path.display())))?;
    let cfg = feeder_config::load_toml(&text)
        .map_err(|e| FeederError::Config(format!("parse {}: {e}", path.display())))?;
    cfg.validate()
        .map_err(|e| FeederError::Config(format!("{}: {e}", path.display())))?;
    Ok(cfg)
}

/// Calibration and the effective display address. `--calibration` wins over
/// `[calibration]`; an address stored in a calibration JSON wins over `[display]`.
fn resolve_calibration(cli: &Cli, cfg: &Config) -> Result<(CalibrationProfile, u8)> {
    let file = cli
        .calibration
        .as_deref()
        .map(feeder_config::load_calibration_file)
        .transpose()
        .map_err(|e| FeederError::Config(e.to_string()))?;
    let addr = cfg.display_addr(file.as_ref());
    let cal = match (&file, &cfg.calibration) {
        (Some(f), _) => f.calibration(),
        (None, Some(cal)) => *cal,
        (None, None) => return Err(BuildError::MissingCalibration.into()),
    };
    let profile = CalibrationProfile::try_from(&cal)?;
    Ok((profile, addr))
}

fn self_check(cli: &Cli, cfg: &Config) -> Result<()> {
    let (calibration, addr) = resolve_calibration(cli, cfg)?;
    let mut feeder = run::build_feeder(cfg, calibration, addr)?;
    let avg = feeder.read_average()?;
    let tick = feeder.step_from_average(avg);
    if cli.json {
        let line = serde_json::json!({
            "ok": true,
            "raw_avg": avg,
            "grams": tick.reading.grams,
        });
        println!("{line}");
    } else {
        println!(
            "self-check ok: raw_avg={avg:.2} weight={:.1} g",
            tick.reading.grams
        );
    }
    feeder.close_gate()?;
    Ok(())
}

fn init_tracing(cli: &Cli, cfg: &Config) -> Result<()> {
    // RUST_LOG > --log-level > [logging].level > info
    let level = cli
        .log_level
        .clone()
        .or_else(|| cfg.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&level))?;

    let console = if cli.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file = match &cfg.logging.file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| FeederError::Config(format!("logging.file {path:?} has no file name")))?;
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
