use thiserror::Error;

/// Failures raised by the drivers in this crate.
#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    /// DOUT never went low within the read timeout.
    #[error("hx711 data-ready timeout")]
    DataReadyTimeout,
}

impl HwError {
    /// Stalls are retried by the control loop; everything else is a fault.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DataReadyTimeout)
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
