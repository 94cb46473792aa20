//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "feeder", version, about = "Weight-triggered feeder")]
pub struct Cli {
    /// Path to config TOML; built-in defaults are used when the file does not exist
    #[arg(long, value_name = "FILE", default_value = "etc/feeder_config.toml")]
    pub config: PathBuf,

    /// Calibration file: JSON from `feeder calibrate`, or a `raw,grams` CSV
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log as JSON lines and print results/errors as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the feeding loop until Ctrl-C
    Run {
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
    },
    /// Two-step calibration: tare on an empty platform, then a known weight
    Calibrate {
        /// Weight placed on the platform in step 2 (grams)
        #[arg(long, value_name = "GRAMS")]
        known_grams: f64,
        /// Where to write the calibration JSON
        #[arg(long, value_name = "FILE", default_value = "hx711_config.json")]
        out: PathBuf,
        /// Raw reads averaged per step
        #[arg(long, value_name = "N", default_value_t = 30)]
        samples: u32,
        /// Pause between averaged reads (ms)
        #[arg(long, value_name = "MS", default_value_t = 50)]
        delay_ms: u64,
    },
    /// Print the weight continuously, only when it moves past a deadband
    Watch {
        /// Minimum change (grams) before a new line is printed
        #[arg(long, value_name = "GRAMS", default_value_t = 0.5)]
        deadband_g: f64,
        /// Stop after this many readings
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
    },
    /// Validate config and calibration, then take one averaged reading
    SelfCheck,
}
