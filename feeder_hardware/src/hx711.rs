//! HX711 24-bit load-cell ADC over its two-wire (DOUT / PD_SCK) serial protocol.
//!
//! The decoder is generic over [`Hx711Bus`] so the frame logic runs the same
//! against rppal GPIO pins and against scripted buses in tests.

use std::time::Duration;

use feeder_traits::{BoxError, LoadCell, MonotonicClock};
use tracing::trace;

use crate::error::Result;
use crate::util::{edge_delay, wait_for_data_ready};

/// Number of data bits in one conversion frame.
pub const FRAME_BITS: u32 = 24;

/// Extra clock pulses after the frame selecting channel A, gain 128.
pub const GAIN_PULSES_A128: u8 = 1;

/// Two GPIO lines of the HX711: DOUT (input) and PD_SCK (output).
pub trait Hx711Bus {
    /// Level of the DOUT line. Low means a conversion is ready.
    fn dt_is_high(&mut self) -> bool;
    /// Drive PD_SCK.
    fn set_sck(&mut self, high: bool);
}

/// Widen a 24-bit two's-complement frame to `i32`.
///
/// Bits above 23 in `frame` are ignored.
#[inline]
pub fn sign_extend_24(frame: u32) -> i32 {
    let v = (frame & 0x00FF_FFFF) as i32;
    if v & 0x0080_0000 != 0 {
        v | !0x00FF_FFFF
    } else {
        v
    }
}

pub struct Hx711<B: Hx711Bus> {
    bus: B,
    gain_pulses: u8,
    poll_interval: Duration,
}

impl<B: Hx711Bus> Hx711<B> {
    pub fn new(mut bus: B, gain_pulses: u8) -> Self {
        bus.set_sck(false); // clock idle low
        Self {
            bus,
            gain_pulses: gain_pulses.max(1),
            poll_interval: Duration::from_micros(200),
        }
    }

    /// Override the data-ready polling interval (zero busy-polls).
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Give the bus back, e.g. to inspect a scripted bus in tests.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Read one frame, waiting at most `timeout` for DOUT to go low.
    ///
    /// There is no checksum in the protocol; a frame clocked out under bad
    /// timing is returned as-is and left to averaging upstream.
    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        let bus = &mut self.bus;
        let busy = wait_for_data_ready(
            &MonotonicClock,
            || bus.dt_is_high(),
            timeout,
            self.poll_interval,
        )?;

        let mut frame: u32 = 0;
        for _ in 0..FRAME_BITS {
            self.bus.set_sck(true);
            edge_delay();
            frame = (frame << 1) | u32::from(self.bus.dt_is_high());
            self.bus.set_sck(false);
            edge_delay();
        }

        // Select gain/channel for the next conversion
        for _ in 0..self.gain_pulses {
            self.bus.set_sck(true);
            edge_delay();
            self.bus.set_sck(false);
            edge_delay();
        }

        let raw = sign_extend_24(frame);
        trace!(raw, frame, busy, "hx711 raw read");
        Ok(raw)
    }
}

impl<B: Hx711Bus> LoadCell for Hx711<B> {
    fn read(&mut self, timeout: Duration) -> std::result::Result<i32, BoxError> {
        Ok(self.read_with_timeout(timeout)?)
    }
}

#[cfg(feature = "hardware")]
pub use gpio::RppalHx711Bus;

#[cfg(feature = "hardware")]
mod gpio {
    use rppal::gpio::{Gpio, InputPin, OutputPin};

    use crate::error::{HwError, Result};

    /// HX711 lines on Raspberry Pi GPIO (BCM numbering).
    pub struct RppalHx711Bus {
        dt: InputPin,
        sck: OutputPin,
    }

    impl RppalHx711Bus {
        pub fn open(dt_pin: u8, sck_pin: u8) -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))?;
            let dt = gpio
                .get(dt_pin)
                .map_err(|e| HwError::Gpio(format!("open hx711 dt pin {dt_pin}: {e}")))?
                .into_input();
            let sck = gpio
                .get(sck_pin)
                .map_err(|e| HwError::Gpio(format!("open hx711 sck pin {sck_pin}: {e}")))?
                .into_output_low();
            Ok(Self { dt, sck })
        }
    }

    impl super::Hx711Bus for RppalHx711Bus {
        #[inline]
        fn dt_is_high(&mut self) -> bool {
            self.dt.is_high()
        }

        #[inline]
        fn set_sck(&mut self, high: bool) {
            if high {
                self.sck.set_high();
            } else {
                self.sck.set_low();
            }
        }
    }
}
