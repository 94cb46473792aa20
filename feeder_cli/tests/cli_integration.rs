use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

/// One visit: arrive, settle at 65 g for the whole window, leave.
const VISIT: &str = "0,0,25,65,65,65,65,65,65,65,65,65,65,65,3,0";

// Minimal sim config with short timings so runs finish quickly
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[calibration]
offset = 80000.0
scale = 400.0

[display]
banner_hold_ms = 0
shutdown_hold_ms = 0

[sampling]
avg_times = 1
avg_delay_ms = 0
tick_ms = 1
read_timeout_ms = 50
max_consecutive_stalls = 3

[decision]
feed_light_s = 0.01
feed_normal_s = 0.01
feed_heavy_s = 0.01

[servo]
settle_ms = 1
min_hold_ms = 1
post_feed_ms = 1
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn feeder() -> Command {
    let mut cmd = Command::cargo_bin("feeder").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("FEEDER_SIM_GRAMS")
        .env_remove("FEEDER_SIM_STALL")
        .arg("--log-level")
        .arg("error");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--max-ticks", "16"], 0, "run complete: ticks=16 feeds=1 stalls=0", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["calibrate"], 2, "--known-grams", "stderr")]
#[case(&["bogus"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = feeder();
    cmd.arg("--config").arg(&cfg).env("FEEDER_SIM_GRAMS", VISIT);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn moving_weight_never_feeds() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    // never stable: the weight keeps moving by 2 g per tick
    feeder()
        .arg("--config")
        .arg(&cfg)
        .env("FEEDER_SIM_GRAMS", "30,32,34,36,38,40,42,44,46,48,50,52")
        .args(["run", "--max-ticks", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("feeds=0"));
}

#[rstest]
fn cli_reports_bad_calibration_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let bad_csv = dir.path().join("calib.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "raw,value").unwrap();
    writeln!(f, "100,0.0").unwrap();
    writeln!(f, "200,1.0").unwrap();

    feeder()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&bad_csv)
        .arg("self-check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn csv_calibration_overrides_config_section() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    // 8000 counts tare, 400 counts/g; the sim replays through this fit
    let csv = dir.path().join("calib.csv");
    fs::write(&csv, "raw,grams\n8000,0\n28000,50\n48000,100\n").unwrap();

    feeder()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .env("FEEDER_SIM_GRAMS", "42")
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("raw_avg=24800.00 weight=42.0 g"));
}

#[rstest]
fn missing_calibration_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, "[display]\nbanner_hold_ms = 0\n").unwrap();

    feeder()
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--max-ticks", "1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No calibration is available"));
}

#[rstest]
#[case("[presence]\non_scale_min_g = 8.0\noff_scale_max_g = 20.0\n", "off_scale_max_g")]
#[case("[stability]\nwindow = 0\n", "stability.window")]
#[case("[sampling]\navg_times = \"many\"\n", "parse")]
fn invalid_config_exits_with_config_code(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, toml).unwrap();

    feeder()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn calibrate_writes_json_in_sim() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = dir.path().join("hx711_config.json");

    let mut cmd = assert_cmd::Command::cargo_bin("feeder").unwrap();
    cmd.env_remove("FEEDER_SIM_GRAMS")
        .env_remove("FEEDER_SIM_STALL")
        .args(["--log-level", "error", "--config"])
        .arg(&cfg)
        .args(["calibrate", "--known-grams", "100", "--samples", "3", "--delay-ms", "0", "--out"])
        .arg(&out)
        .write_stdin("\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("offset=8000.00 scale=400.0000"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(saved["offset"].as_f64(), Some(8000.0));
    assert_eq!(saved["scale"].as_f64(), Some(400.0));
    assert_eq!(saved["i2c_addr"].as_u64(), Some(0x27));

    // the saved file feeds straight back into a run
    feeder()
        .arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&out)
        .env("FEEDER_SIM_GRAMS", VISIT)
        .args(["run", "--max-ticks", "16"])
        .assert()
        .success()
        .stdout(predicate::str::contains("feeds=1"));
}

#[rstest]
fn calibrate_rejects_non_positive_weight() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    feeder()
        .arg("--config")
        .arg(&cfg)
        .args(["calibrate", "--known-grams", "0", "--out"])
        .arg(dir.path().join("cal.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--known-grams must be a positive weight"));
}

#[rstest]
fn watch_prints_only_past_deadband() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = feeder()
        .arg("--config")
        .arg(&cfg)
        .env("FEEDER_SIM_GRAMS", "0,0.2,50")
        .args(["watch", "--deadband-g", "0.5", "--max-ticks", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with("Raw_avg")).collect();
    assert_eq!(lines.len(), 2, "stdout was: {stdout}");
    assert!(lines[0].ends_with("Weight =     0.0 g"));
    assert!(lines[1].ends_with("Weight =    50.0 g"));
}
