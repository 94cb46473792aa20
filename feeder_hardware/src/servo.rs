//! Hobby servo on a software-PWM GPIO (Raspberry Pi).

use feeder_traits::{Actuator, BoxError};
use rppal::gpio::{Gpio, OutputPin};
use tracing::trace;

use crate::error::{HwError, Result};

pub struct ServoPwm {
    pin: OutputPin,
    frequency_hz: f64,
}

impl ServoPwm {
    pub fn open(pin: u8, frequency_hz: f64) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("open servo pin {pin}: {e}")))?
            .into_output_low();
        Ok(Self { pin, frequency_hz })
    }
}

impl Actuator for ServoPwm {
    fn set_duty(&mut self, duty_percent: f64) -> std::result::Result<(), BoxError> {
        trace!(duty_percent, "servo duty");
        if duty_percent <= 0.0 {
            self.pin
                .clear_pwm()
                .map_err(|e| HwError::Pwm(e.to_string()))?;
            return Ok(());
        }
        let duty_cycle = (duty_percent / 100.0).clamp(0.0, 1.0);
        self.pin
            .set_pwm_frequency(self.frequency_hz, duty_cycle)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(())
    }
}
