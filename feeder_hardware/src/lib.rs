//! Hardware drivers and simulators for the feeder.
//!
//! - `hx711`: bit-banged load-cell ADC decoder (generic over its two GPIO lines)
//! - `lcd`: HD44780 character LCD behind a PCF8574 I2C backpack
//! - `servo`: software-PWM servo output (feature `hardware`)
//! - `sim`: scripted load cell, recording servo, tracing display
pub mod error;
pub mod hx711;
pub mod lcd;
#[cfg(feature = "hardware")]
pub mod servo;
pub mod sim;
pub mod util;

pub use error::HwError;
pub use hx711::{Hx711, Hx711Bus, sign_extend_24};
pub use lcd::{ByteBus, Lcd1602};
pub use sim::{SimulatedLoadCell, SimulatedServo, TracingDisplay};

#[cfg(feature = "hardware")]
pub use hx711::RppalHx711Bus;
#[cfg(feature = "hardware")]
pub use lcd::I2cByteBus;
#[cfg(feature = "hardware")]
pub use servo::ServoPwm;
