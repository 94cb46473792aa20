#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use feeder_core::mocks::RecordingDisplay;
use feeder_core::{CalibrationProfile, Feeder, FeederBuilder, SamplingCfg, Set};
use feeder_hardware::{SimulatedLoadCell, SimulatedServo};
use feeder_traits::clock::test_clock::TestClock;

pub const OFFSET: f64 = 80_000.0;
pub const SCALE: f64 = 400.0;
pub const AVG_TIMES: u32 = 3;
pub const TIMESTAMP: &str = "10/16 08:00:00";

/// Observers kept outside the feeder.
pub struct Handles {
    pub clock: TestClock,
    pub servo: Arc<Mutex<Vec<f64>>>,
    pub display: RecordingDisplay,
}

impl Handles {
    pub fn duties(&self) -> Vec<f64> {
        self.servo.lock().unwrap().clone()
    }
}

pub fn profile() -> CalibrationProfile {
    CalibrationProfile::new(OFFSET, SCALE).unwrap()
}

pub fn sampling() -> SamplingCfg {
    SamplingCfg {
        avg_times: AVG_TIMES,
        avg_delay: Duration::from_millis(20),
        read_timeout: Duration::from_millis(5),
    }
}

/// Builder wired to `cell` (one script entry per tick), a recording servo,
/// a recording display and a virtual clock.
pub fn builder_for(cell: SimulatedLoadCell) -> (FeederBuilder<Set, Set, Set>, Handles) {
    let clock = TestClock::new();
    let servo = SimulatedServo::new();
    let history = servo.history();
    let display = RecordingDisplay::new();
    let builder = Feeder::builder()
        .with_load_cell(cell.with_reads_per_step(AVG_TIMES))
        .with_actuator(servo)
        .with_calibration(profile())
        .with_sampling(sampling())
        .with_display(display.clone())
        .with_clock(Box::new(clock.clone()))
        .with_timestamp_source(|| TIMESTAMP.to_string());
    (
        builder,
        Handles {
            clock,
            servo: history,
            display,
        },
    )
}

pub fn scripted(grams: &[f64]) -> (Feeder, Handles) {
    let cell = SimulatedLoadCell::new(OFFSET, SCALE).with_script(grams.iter().copied());
    let (builder, handles) = builder_for(cell);
    (builder.build().unwrap(), handles)
}
