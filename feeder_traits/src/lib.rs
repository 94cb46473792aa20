pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type used at every hardware trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One load-cell ADC transaction.
pub trait LoadCell {
    /// Block until one signed raw sample is available or `timeout` expires.
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError>;
}

/// PWM-driven actuator (servo gate).
pub trait Actuator {
    /// Request an output duty in percent. `0.0` releases the output.
    fn set_duty(&mut self, duty_percent: f64) -> Result<(), BoxError>;
}

/// Two-line character display or telemetry sink.
///
/// Writes are best-effort: implementations own their retry policy and
/// report failure through the return value only.
pub trait Display {
    fn write_lines(&mut self, line1: &str, line2: &str) -> bool;

    /// Blank the screen.
    fn blank(&mut self) -> bool {
        self.write_lines("", "")
    }
}

impl<T: LoadCell + ?Sized> LoadCell for Box<T> {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i32, BoxError> {
        (**self).read(timeout)
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn set_duty(&mut self, duty_percent: f64) -> Result<(), BoxError> {
        (**self).set_duty(duty_percent)
    }
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn write_lines(&mut self, line1: &str, line2: &str) -> bool {
        (**self).write_lines(line1, line2)
    }

    fn blank(&mut self) -> bool {
        (**self).blank()
    }
}
