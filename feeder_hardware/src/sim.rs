//! Simulated hardware for development hosts and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use feeder_traits::{Actuator, BoxError, Display, LoadCell};
use tracing::{debug, info};

use crate::error::HwError;

/// Load cell that replays a script of gram values through an inverse
/// calibration (`raw = grams * scale + offset`).
///
/// Each script entry is served `reads_per_step` times, so one entry maps to
/// one averaged control-loop tick. The last entry repeats once the script
/// runs out; an empty script reads an empty platform.
pub struct SimulatedLoadCell {
    script: VecDeque<f64>,
    last_g: f64,
    offset: f64,
    scale: f64,
    reads_per_step: u32,
    served: u32,
    stalled: bool,
}

impl SimulatedLoadCell {
    pub fn new(offset: f64, scale: f64) -> Self {
        Self {
            script: VecDeque::new(),
            last_g: 0.0,
            offset,
            scale,
            reads_per_step: 1,
            served: 0,
            stalled: false,
        }
    }

    pub fn with_script(mut self, grams: impl IntoIterator<Item = f64>) -> Self {
        self.script = grams.into_iter().collect();
        self
    }

    pub fn with_reads_per_step(mut self, n: u32) -> Self {
        self.reads_per_step = n.max(1);
        self
    }

    /// Never signal data-ready; every read times out.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    fn current_grams(&mut self) -> f64 {
        if let Some(&g) = self.script.front() {
            self.last_g = g;
            self.served += 1;
            if self.served >= self.reads_per_step {
                self.served = 0;
                self.script.pop_front();
            }
        }
        self.last_g
    }
}

impl LoadCell for SimulatedLoadCell {
    fn read(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        if self.stalled {
            return Err(Box::new(HwError::DataReadyTimeout));
        }
        let g = self.current_grams();
        let raw = (g * self.scale + self.offset).round();
        let raw = raw.clamp(-8_388_608.0, 8_388_607.0) as i32;
        debug!(grams = g, raw, "simulated load cell read");
        Ok(raw)
    }
}

/// Servo stand-in that records every commanded duty.
#[derive(Clone, Default)]
pub struct SimulatedServo {
    duties: Arc<Mutex<Vec<f64>>>,
}

impl SimulatedServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the duty history.
    pub fn history(&self) -> Arc<Mutex<Vec<f64>>> {
        self.duties.clone()
    }
}

impl Actuator for SimulatedServo {
    fn set_duty(&mut self, duty_percent: f64) -> Result<(), BoxError> {
        debug!(duty_percent, "simulated servo duty");
        self.duties
            .lock()
            .map_err(|_| HwError::Pwm("servo history poisoned".into()))?
            .push(duty_percent);
        Ok(())
    }
}

/// Display that emits each refresh as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDisplay;

impl Display for TracingDisplay {
    fn write_lines(&mut self, line1: &str, line2: &str) -> bool {
        info!(target: "feeder::display", line1, line2, "display");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_through_inverse_calibration() {
        let mut cell = SimulatedLoadCell::new(1000.0, 400.0).with_script([0.0, 25.0]);
        let t = Duration::from_millis(1);
        assert_eq!(cell.read(t).unwrap(), 1000);
        assert_eq!(cell.read(t).unwrap(), 11_000);
        // script exhausted: last value repeats
        assert_eq!(cell.read(t).unwrap(), 11_000);
    }

    #[test]
    fn reads_per_step_holds_each_entry() {
        let mut cell = SimulatedLoadCell::new(0.0, 1.0)
            .with_script([1.0, 2.0])
            .with_reads_per_step(3);
        let t = Duration::from_millis(1);
        let got: Vec<i32> = (0..6).map(|_| cell.read(t).unwrap()).collect();
        assert_eq!(got, vec![1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn stalled_cell_times_out() {
        let mut cell = SimulatedLoadCell::new(0.0, 1.0).stalled();
        let err = cell.read(Duration::from_millis(1)).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn servo_records_duties() {
        let mut servo = SimulatedServo::new();
        let history = servo.history();
        servo.set_duty(7.0).unwrap();
        servo.set_duty(0.0).unwrap();
        assert_eq!(*history.lock().unwrap(), vec![7.0, 0.0]);
    }
}
