use feeder_core::error::BuildError;
use feeder_core::{CalibrationProfile, DecisionTable, Feeder, PresenceCfg, StabilityCfg};
use feeder_hardware::{SimulatedLoadCell, SimulatedServo};
use rstest::rstest;

fn cal() -> CalibrationProfile {
    CalibrationProfile::new(0.0, 1.0).unwrap()
}

#[rstest]
fn builder_missing_load_cell_yields_typed_build_error() {
    let err = Feeder::builder()
        .with_actuator(SimulatedServo::new())
        .with_calibration(cal())
        .try_build()
        .expect_err("should fail with MissingLoadCell");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingLoadCell) => {}
        other => panic!("expected MissingLoadCell, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_actuator_yields_typed_build_error() {
    let err = Feeder::builder()
        .with_load_cell(SimulatedLoadCell::new(0.0, 1.0))
        .with_calibration(cal())
        .try_build()
        .expect_err("should fail with MissingActuator");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingActuator)
    ));
}

#[rstest]
fn builder_missing_calibration_yields_typed_build_error() {
    let err = Feeder::builder()
        .with_load_cell(SimulatedLoadCell::new(0.0, 1.0))
        .with_actuator(SimulatedServo::new())
        .try_build()
        .expect_err("should fail with MissingCalibration");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingCalibration)
    ));
}

fn complete() -> feeder_core::FeederBuilder<feeder_core::Set, feeder_core::Set, feeder_core::Set> {
    Feeder::builder()
        .with_load_cell(SimulatedLoadCell::new(0.0, 1.0))
        .with_actuator(SimulatedServo::new())
        .with_calibration(cal())
}

#[rstest]
#[case::inverted_hysteresis(
    complete().with_presence(PresenceCfg { on_scale_min_g: 8.0, off_scale_max_g: 20.0 }),
    "off_scale_max_g"
)]
#[case::empty_window(
    complete().with_stability(StabilityCfg { window: 0, threshold_g: 1.0 }),
    "window"
)]
#[case::inverted_bands(
    complete().with_decision(DecisionTable { low_g: 90.0, high_g: 60.0, ..DecisionTable::default() }),
    "low_g"
)]
#[case::negative_feed_time(
    complete().with_decision(DecisionTable { feed_heavy_s: -0.1, ..DecisionTable::default() }),
    "feed_heavy_s"
)]
fn builder_rejects_invalid_config(
    #[case] builder: feeder_core::FeederBuilder<feeder_core::Set, feeder_core::Set, feeder_core::Set>,
    #[case] needle: &str,
) {
    let err = builder.build().expect_err("config should be rejected");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn defaults_build() {
    let feeder = complete().build().expect("defaults are valid");
    assert_eq!(feeder.feeds(), 0);
    assert_eq!(feeder.state(), feeder_core::VisitState::Idle);
}
