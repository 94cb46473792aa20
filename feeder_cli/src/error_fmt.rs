//! Human-readable error descriptions, exit codes and structured JSON errors.

use feeder_core::error::{BuildError, FeederError};

fn find_feeder_error(err: &eyre::Report) -> Option<&FeederError> {
    err.chain().find_map(|e| e.downcast_ref::<FeederError>())
}

fn find_build_error(err: &eyre::Report) -> Option<&BuildError> {
    err.chain().find_map(|e| e.downcast_ref::<BuildError>())
}

fn is_csv_header_error(msg: &str) -> bool {
    msg.to_ascii_lowercase()
        .contains("calibration csv must have headers")
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = find_build_error(err) {
        return match be {
            BuildError::MissingLoadCell => {
                "What happened: No load cell was provided to the feeder.\nLikely causes: The HX711 failed to initialize or was not wired into the builder.\nHow to fix: Check the [pins] section and the HX711 wiring, then rerun.".to_string()
            }
            BuildError::MissingActuator => {
                "What happened: No servo was provided to the feeder.\nLikely causes: The servo pin failed to initialize.\nHow to fix: Check pins.servo in the config and GPIO permissions.".to_string()
            }
            BuildError::MissingCalibration => {
                "What happened: No calibration is available.\nLikely causes: Neither --calibration nor a [calibration] section was given.\nHow to fix: Run `feeder calibrate --known-grams <g>` and pass the JSON with --calibration.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(fe) = find_feeder_error(err) {
        return match fe {
            FeederError::Timeout => {
                "What happened: Scale read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify DT/SCK pins and power, and consider increasing sampling.read_timeout_ms in the config.".to_string()
            }
            FeederError::Config(msg) if is_csv_header_error(msg) => {
                "Invalid headers in calibration CSV. Expected 'raw,grams'.".to_string()
            }
            FeederError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: A malformed or out-of-range value in the config or calibration file.\nHow to fix: Edit the file named above, then rerun."
            ),
            FeederError::Hardware(msg) | FeederError::HardwareFault(msg) => format!(
                "What happened: Hardware error ({msg}).\nLikely causes: Wiring, power, or GPIO/I2C permissions.\nHow to fix: Check the connections and re-run with --log-level=debug for detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if is_csv_header_error(&lower) {
        return "Invalid headers in calibration CSV. Expected 'raw,grams'.".to_string();
    }

    if lower.contains("open hx711") || lower.contains("open servo pin") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for a stalled load cell, 4 for configuration problems, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(be) = find_build_error(err) {
        return match be {
            BuildError::MissingCalibration | BuildError::InvalidConfig(_) => 4,
            BuildError::MissingLoadCell | BuildError::MissingActuator => 1,
        };
    }
    match find_feeder_error(err) {
        Some(FeederError::Timeout) => 3,
        Some(FeederError::Config(_)) => 4,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if find_build_error(err).is_some() {
        return "Build";
    }
    match find_feeder_error(err) {
        Some(FeederError::Timeout) => "Timeout",
        Some(FeederError::Config(_)) => "Config",
        Some(FeederError::Hardware(_) | FeederError::HardwareFault(_)) => "Hardware",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
