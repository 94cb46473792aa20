#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration files for the feeder.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section is optional; defaults match the stock feeder build.
//! - Calibration comes from `[calibration]`, a JSON file written by
//!   `feeder calibrate`, or a `raw,grams` CSV fitted by least squares.
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Calibration CSV schema.
///
/// Expected headers:
/// raw,grams
///
/// Example:
/// raw,grams
/// 84213,0.0
/// 125443,100.0
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    pub raw: i64,
    pub grams: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub hx711_dt: u8,
    pub hx711_sck: u8,
    pub servo: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            hx711_dt: 5,
            hx711_sck: 6,
            servo: 18,
        }
    }
}

/// Load-cell calibration: `grams = (raw - offset) / scale`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct CalibrationCfg {
    /// raw counts with an empty platform (tare)
    pub offset: f64,
    /// raw counts per gram
    pub scale: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayCfg {
    pub enabled: bool,
    pub i2c_bus: u8,
    /// 7-bit address of the PCF8574 backpack (39 = 0x27)
    pub i2c_addr: u8,
    /// Write attempts per refresh before giving up on that refresh
    pub retries: u32,
    /// Skip IDLE refreshes until the weight moves by at least this much
    pub min_refresh_delta_g: f64,
    /// How long the startup banner stays up before the first tick (ms)
    pub banner_hold_ms: u64,
    /// How long the shutdown message stays up before the display is cleared (ms)
    pub shutdown_hold_ms: u64,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            i2c_bus: 1,
            i2c_addr: 0x27,
            retries: 3,
            min_refresh_delta_g: 0.1,
            banner_hold_ms: 1000,
            shutdown_hold_ms: 600,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    /// Raw reads averaged per control tick
    pub avg_times: u32,
    /// Pause between averaged reads (ms)
    pub avg_delay_ms: u64,
    /// Pause between control ticks (ms)
    pub tick_ms: u64,
    /// Max wait for HX711 data-ready per raw read (ms)
    pub read_timeout_ms: u64,
    /// Abort the run after this many consecutive timed-out ticks (0 = never)
    pub max_consecutive_stalls: u32,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            avg_times: 12,
            avg_delay_ms: 20,
            tick_ms: 150,
            read_timeout_ms: 500,
            max_consecutive_stalls: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PresenceCfg {
    /// At or above this weight the platform counts as occupied
    pub on_scale_min_g: f64,
    /// At or below this weight an occupied platform counts as vacated
    pub off_scale_max_g: f64,
}

impl Default for PresenceCfg {
    fn default() -> Self {
        Self {
            on_scale_min_g: 20.0,
            off_scale_max_g: 8.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StabilityCfg {
    /// Samples in the stability window
    pub window: usize,
    /// Max spread (max - min) of a full window to count as stable
    pub threshold_g: f64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            window: 10,
            threshold_g: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DecisionCfg {
    pub low_g: f64,
    pub high_g: f64,
    pub feed_light_s: f64,
    pub feed_normal_s: f64,
    pub feed_heavy_s: f64,
}

impl Default for DecisionCfg {
    fn default() -> Self {
        Self {
            low_g: 60.0,
            high_g: 90.0,
            feed_light_s: 0.30,
            feed_normal_s: 0.20,
            feed_heavy_s: 0.10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServoCfg {
    pub open_angle: f64,
    pub close_angle: f64,
    /// Time a move is driven before the output is released (ms)
    pub settle_ms: u64,
    /// Floor on the open hold time (ms)
    pub min_hold_ms: u64,
    /// Pause after a dispense before polling resumes (ms)
    pub post_feed_ms: u64,
    pub pwm_hz: f64,
}

impl Default for ServoCfg {
    fn default() -> Self {
        Self {
            open_angle: 90.0,
            close_angle: 0.0,
            settle_ms: 350,
            min_hold_ms: 50,
            post_feed_ms: 800,
            pwm_hz: 50.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    /// Optional inline calibration; a `--calibration` file takes precedence.
    pub calibration: Option<CalibrationCfg>,
    pub display: DisplayCfg,
    pub sampling: SamplingCfg,
    pub presence: PresenceCfg,
    pub stability: StabilityCfg,
    pub decision: DecisionCfg,
    pub servo: ServoCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl CalibrationCfg {
    pub fn validate(&self) -> eyre::Result<()> {
        if !self.offset.is_finite() {
            eyre::bail!("calibration.offset must be finite");
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            eyre::bail!("calibration.scale must be finite and non-zero");
        }
        Ok(())
    }

    /// Fit `raw = scale * grams + offset` by ordinary least squares on all rows,
    /// then refit once without residuals beyond 2 sigma.
    pub fn from_rows(rows: Vec<CalibrationRow>) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }

        // Ensure strictly monotonic raw values (increasing or decreasing), no duplicates
        let mut dir: i8 = 0; // 1 for increasing, -1 for decreasing
        for i in 1..rows.len() {
            let d = rows[i].raw - rows[i - 1].raw;
            if d == 0 {
                eyre::bail!(
                    "calibration rows have duplicate raw values at index {} and {}",
                    i - 1,
                    i
                );
            }
            let step_dir = if d > 0 { 1 } else { -1 };
            if dir == 0 {
                dir = step_dir;
            } else if dir != step_dir {
                eyre::bail!(
                    "calibration raw values must be monotonic (strictly increasing or strictly decreasing)"
                );
            }
        }

        let pts: Vec<(f64, f64)> = rows.iter().map(|r| (r.grams, r.raw as f64)).collect();
        let (a0, b0) = ols(&pts)?;
        let sumsq: f64 = pts
            .iter()
            .map(|(x, y)| {
                let r = y - (a0 * x + b0);
                r * r
            })
            .sum();
        let rms = (sumsq / pts.len() as f64).sqrt();

        let (scale, offset) = robust_refit(&pts, a0, b0, rms, 2.0).unwrap_or((a0, b0));
        let cal = Self { offset, scale };
        cal.validate()?;
        Ok(cal)
    }
}

/// Least-squares line `y = a*x + b` over `(x, y)` points.
fn ols(pts: &[(f64, f64)]) -> eyre::Result<(f64, f64)> {
    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let mut sxx = 0.0f64;
    let mut sxy = 0.0f64;
    for (x, y) in pts {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }
    if !sxx.is_finite() || sxx == 0.0 {
        eyre::bail!("calibration cannot determine slope (all rows have the same grams)");
    }
    let a = sxy / sxx;
    if !a.is_finite() || a == 0.0 {
        eyre::bail!("calibration produced zero or non-finite slope (invalid scale)");
    }
    Ok((a, mean_y - a * mean_x))
}

/// Reject points with |residual| > k * rms around `y = a0*x + b0` and refit
/// on the inliers using an online (Welford/Chan) covariance update.
/// Returns None when no point is rejected or too few remain.
fn robust_refit(pts: &[(f64, f64)], a0: f64, b0: f64, rms: f64, k: f64) -> Option<(f64, f64)> {
    if !(rms.is_finite() && rms > 0.0) {
        return None;
    }
    let thr = k * rms;
    let mut n_in: usize = 0;
    let mut mean_x = 0.0f64;
    let mut mean_y = 0.0f64;
    let mut cxx = 0.0f64;
    let mut cxy = 0.0f64;

    for &(x, y) in pts {
        if (y - (a0 * x + b0)).abs() <= thr {
            n_in += 1;
            let n = n_in as f64;
            let dx = x - mean_x;
            mean_x += dx / n;
            mean_y += (y - mean_y) / n;
            cxx += dx * (x - mean_x);
            cxy += dx * (y - mean_y);
        }
    }

    if n_in < 2 || n_in == pts.len() || !cxx.is_finite() || cxx == 0.0 {
        return None;
    }
    let a = cxy / cxx;
    if !a.is_finite() || a == 0.0 {
        return None;
    }
    Some((a, mean_y - a * mean_x))
}

impl TryFrom<Vec<CalibrationRow>> for CalibrationCfg {
    type Error = eyre::Report;
    fn try_from(rows: Vec<CalibrationRow>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

pub fn load_calibration_csv(path: &Path) -> eyre::Result<CalibrationCfg> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["raw", "grams"];
    let actual: Vec<String> = headers.iter().map(|s| s.trim().to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'raw,grams', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    CalibrationCfg::try_from(rows)
}

/// JSON calibration file written by `feeder calibrate`.
///
/// ```json
/// { "offset": 84213.4, "scale": 412.7, "i2c_addr": 39 }
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct CalibrationFile {
    pub offset: f64,
    pub scale: f64,
    /// Display address recorded alongside the calibration; overrides `[display]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i2c_addr: Option<u8>,
}

impl CalibrationFile {
    pub fn calibration(&self) -> CalibrationCfg {
        CalibrationCfg {
            offset: self.offset,
            scale: self.scale,
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        self.calibration().validate()?;
        if self.i2c_addr.is_some_and(|a| a > 0x7F) {
            eyre::bail!("calibration i2c_addr must be a 7-bit address (<= 0x7F)");
        }
        Ok(())
    }
}

pub fn load_calibration_json(path: &Path) -> eyre::Result<CalibrationFile> {
    let text = fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("open calibration JSON {:?}: {}", path, e))?;
    let file: CalibrationFile = serde_json::from_str(&text)
        .map_err(|e| eyre::eyre!("parse calibration JSON {:?}: {}", path, e))?;
    file.validate()?;
    Ok(file)
}

/// Persist a calibration file atomically (temp file, fsync, rename).
pub fn save_calibration_json(path: &Path, file: &CalibrationFile) -> eyre::Result<()> {
    file.validate()?;
    let bytes = serde_json::to_vec_pretty(file)?;
    write_atomic(path, &bytes)
        .map_err(|e| eyre::eyre!("write calibration JSON {:?}: {}", path, e))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

/// Load calibration from a `.json` or `.csv` file, picked by extension.
pub fn load_calibration_file(path: &Path) -> eyre::Result<CalibrationFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => {
            let cal = load_calibration_csv(path)?;
            Ok(CalibrationFile {
                offset: cal.offset,
                scale: cal.scale,
                i2c_addr: None,
            })
        }
        _ => load_calibration_json(path),
    }
}

impl Config {
    /// LCD address in effect: one recorded in the calibration file wins over `[display]`.
    pub fn display_addr(&self, calibration: Option<&CalibrationFile>) -> u8 {
        calibration
            .and_then(|c| c.i2c_addr)
            .unwrap_or(self.display.i2c_addr)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Calibration
        if let Some(cal) = &self.calibration {
            cal.validate()?;
        }

        // Display
        if self.display.i2c_addr > 0x7F {
            eyre::bail!("display.i2c_addr must be a 7-bit address (<= 0x7F)");
        }
        if self.display.retries == 0 {
            eyre::bail!("display.retries must be >= 1");
        }
        if !(self.display.min_refresh_delta_g >= 0.0) {
            eyre::bail!("display.min_refresh_delta_g must be >= 0");
        }

        // Sampling
        if self.sampling.avg_times == 0 {
            eyre::bail!("sampling.avg_times must be >= 1");
        }
        if self.sampling.read_timeout_ms == 0 {
            eyre::bail!("sampling.read_timeout_ms must be >= 1");
        }
        if self.sampling.avg_delay_ms > 10_000 {
            eyre::bail!("sampling.avg_delay_ms is unreasonably large (>10s)");
        }

        // Presence
        let p = &self.presence;
        if !(p.on_scale_min_g.is_finite() && p.off_scale_max_g.is_finite()) {
            eyre::bail!("presence thresholds must be finite");
        }
        if p.off_scale_max_g < 0.0 {
            eyre::bail!("presence.off_scale_max_g must be >= 0");
        }
        if p.off_scale_max_g >= p.on_scale_min_g {
            eyre::bail!("presence.off_scale_max_g must be < presence.on_scale_min_g");
        }

        // Stability
        if self.stability.window == 0 {
            eyre::bail!("stability.window must be >= 1");
        }
        if !(self.stability.threshold_g >= 0.0 && self.stability.threshold_g.is_finite()) {
            eyre::bail!("stability.threshold_g must be finite and >= 0");
        }

        // Decision
        let d = &self.decision;
        if !(d.low_g.is_finite() && d.high_g.is_finite()) {
            eyre::bail!("decision thresholds must be finite");
        }
        if d.low_g >= d.high_g {
            eyre::bail!("decision.low_g must be < decision.high_g");
        }
        for (name, v) in [
            ("feed_light_s", d.feed_light_s),
            ("feed_normal_s", d.feed_normal_s),
            ("feed_heavy_s", d.feed_heavy_s),
        ] {
            if !(v.is_finite() && (0.0..=60.0).contains(&v)) {
                eyre::bail!("decision.{name} must be in [0, 60] seconds");
            }
        }

        // Servo
        let s = &self.servo;
        for (name, angle) in [("open_angle", s.open_angle), ("close_angle", s.close_angle)] {
            if !(0.0..=180.0).contains(&angle) {
                eyre::bail!("servo.{name} must be in [0, 180] degrees");
            }
        }
        if !(s.pwm_hz.is_finite() && s.pwm_hz > 0.0) {
            eyre::bail!("servo.pwm_hz must be > 0");
        }

        Ok(())
    }
}
