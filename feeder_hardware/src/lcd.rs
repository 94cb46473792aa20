//! HD44780 16x2 character LCD behind a PCF8574 I2C backpack (4-bit mode).
//!
//! Bus layout of the backpack byte: P0 = RS, P2 = EN, P3 = backlight,
//! P4..P7 = D4..D7.

use std::time::Duration;

use feeder_traits::{Clock, Display};
use tracing::{debug, warn};

use crate::error::Result;

pub const LCD_WIDTH: usize = 16;
pub const LINE_1: u8 = 0x80;
pub const LINE_2: u8 = 0xC0;

const MODE_CMD: u8 = 0;
const MODE_CHR: u8 = 1;
const BACKLIGHT: u8 = 0x08;
const ENABLE: u8 = 0b0000_0100;
const INIT_SEQUENCE: [u8; 6] = [0x33, 0x32, 0x06, 0x0C, 0x28, 0x01];
const CLEAR: u8 = 0x01;

/// Single-byte writer to the expander (I2C in production).
pub trait ByteBus {
    fn write_byte(&mut self, byte: u8) -> Result<()>;
}

/// Split `bits` into the high and low nibble frames the backpack expects.
#[inline]
pub fn nibble_frames(bits: u8, mode: u8) -> [u8; 2] {
    let high = mode | (bits & 0xF0) | BACKLIGHT;
    let low = mode | ((bits << 4) & 0xF0) | BACKLIGHT;
    [high, low]
}

/// Pad or truncate `msg` to exactly `LCD_WIDTH` characters.
pub fn fit_line(msg: &str) -> String {
    let mut out: String = msg.chars().take(LCD_WIDTH).collect();
    let n = out.chars().count();
    out.extend(std::iter::repeat_n(' ', LCD_WIDTH - n));
    out
}

pub struct Lcd1602<B: ByteBus, C: Clock> {
    bus: B,
    clock: C,
    retries: u32,
}

impl<B: ByteBus, C: Clock> Lcd1602<B, C> {
    /// Wrap the bus; the controller is not touched until [`Lcd1602::init`].
    pub fn new(bus: B, clock: C, retries: u32) -> Self {
        Self {
            bus,
            clock,
            retries: retries.max(1),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        for cmd in INIT_SEQUENCE {
            self.send(cmd, MODE_CMD)?;
        }
        self.clock.sleep(Duration::from_millis(5));
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.send(CLEAR, MODE_CMD)
    }

    pub fn write_line(&mut self, msg: &str, line: u8) -> Result<()> {
        self.send(line, MODE_CMD)?;
        for ch in fit_line(msg).chars() {
            let code = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.send(code, MODE_CHR)?;
        }
        Ok(())
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    fn send(&mut self, bits: u8, mode: u8) -> Result<()> {
        for frame in nibble_frames(bits, mode) {
            self.bus.write_byte(frame)?;
            self.toggle_enable(frame)?;
        }
        Ok(())
    }

    fn toggle_enable(&mut self, frame: u8) -> Result<()> {
        let pulse = Duration::from_micros(500);
        self.clock.sleep(pulse);
        self.bus.write_byte(frame | ENABLE)?;
        self.clock.sleep(pulse);
        self.bus.write_byte(frame & !ENABLE)?;
        self.clock.sleep(pulse);
        Ok(())
    }
}

impl<B: ByteBus, C: Clock> Display for Lcd1602<B, C> {
    fn write_lines(&mut self, line1: &str, line2: &str) -> bool {
        for attempt in 1..=self.retries {
            let res = self
                .write_line(line1, LINE_1)
                .and_then(|()| self.write_line(line2, LINE_2));
            match res {
                Ok(()) => return true,
                Err(e) => {
                    debug!(attempt, error = %e, "lcd write failed; reinitialising");
                    if let Err(e) = self.init() {
                        debug!(error = %e, "lcd reinit failed");
                    }
                    self.clock
                        .sleep(Duration::from_millis(50 * u64::from(attempt)));
                }
            }
        }
        warn!(retries = self.retries, "lcd write gave up");
        false
    }

    fn blank(&mut self) -> bool {
        match self.clear() {
            Ok(()) => {
                // the clear command needs ~1.5 ms before the next write
                self.clock.sleep(Duration::from_millis(2));
                true
            }
            Err(e) => {
                debug!(error = %e, "lcd clear failed");
                false
            }
        }
    }
}

#[cfg(feature = "hardware")]
pub use i2c::I2cByteBus;

#[cfg(feature = "hardware")]
mod i2c {
    use rppal::i2c::I2c;

    use crate::error::{HwError, Result};

    /// PCF8574 expander on a Raspberry Pi I2C bus.
    pub struct I2cByteBus {
        i2c: I2c,
    }

    impl I2cByteBus {
        pub fn open(bus: u8, addr: u8) -> Result<Self> {
            let mut i2c = I2c::with_bus(bus)
                .map_err(|e| HwError::I2c(format!("open i2c bus {bus}: {e}")))?;
            i2c.set_slave_address(u16::from(addr))
                .map_err(|e| HwError::I2c(format!("set address {addr:#04x}: {e}")))?;
            Ok(Self { i2c })
        }
    }

    impl super::ByteBus for I2cByteBus {
        fn write_byte(&mut self, byte: u8) -> Result<()> {
            self.i2c
                .write(&[byte])
                .map(|_| ())
                .map_err(|e| HwError::I2c(e.to_string()))
        }
    }
}
