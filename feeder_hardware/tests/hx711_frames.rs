//! Frame decoding against a scripted two-wire bus.

use std::time::Duration;

use feeder_hardware::hx711::{GAIN_PULSES_A128, Hx711, Hx711Bus, sign_extend_24};
use feeder_traits::LoadCell;
use proptest::prelude::*;
use rstest::rstest;

/// Serves a queue of frames; DOUT stays high for `busy_polls` polls before
/// each frame to exercise the data-ready wait.
struct ScriptedBus {
    frames: Vec<u32>,
    busy_polls: u32,
    polls_left: u32,
    bit: u32,
    sck_high: bool,
}

impl ScriptedBus {
    fn new(frames: Vec<u32>, busy_polls: u32) -> Self {
        Self {
            frames,
            busy_polls,
            polls_left: busy_polls,
            bit: 0,
            sck_high: false,
        }
    }
}

impl Hx711Bus for ScriptedBus {
    fn dt_is_high(&mut self) -> bool {
        if !self.sck_high {
            if self.polls_left > 0 {
                self.polls_left -= 1;
                return true;
            }
            return false;
        }
        let frame = self.frames.first().copied().unwrap_or(0);
        let level = (frame >> (23 - self.bit)) & 1 == 1;
        self.bit += 1;
        if self.bit == 24 {
            self.bit = 0;
            self.polls_left = self.busy_polls;
            if !self.frames.is_empty() {
                self.frames.remove(0);
            }
        }
        level
    }

    fn set_sck(&mut self, high: bool) {
        self.sck_high = high;
    }
}

#[rstest]
#[case(0x00_0001, 1)]
#[case(0x7F_FFFF, 8_388_607)]
#[case(0x80_0000, -8_388_608)]
#[case(0xFF_FF00, -256)]
fn load_cell_reads_decode_frames(#[case] frame: u32, #[case] expected: i32) {
    let bus = ScriptedBus::new(vec![frame], 3);
    let mut adc = Hx711::new(bus, GAIN_PULSES_A128).with_poll_interval(Duration::ZERO);
    let got = adc.read(Duration::from_millis(50)).expect("frame");
    assert_eq!(got, expected);
}

#[test]
fn consecutive_frames_stay_aligned() {
    let bus = ScriptedBus::new(vec![0x00_0010, 0xFF_FFF0, 0x00_0000], 2);
    let mut adc = Hx711::new(bus, GAIN_PULSES_A128).with_poll_interval(Duration::ZERO);
    let t = Duration::from_millis(50);
    let got: Vec<i32> = (0..3).map(|_| adc.read_with_timeout(t).unwrap()).collect();
    assert_eq!(got, vec![16, -16, 0]);
}

#[test]
fn never_ready_times_out() {
    let bus = ScriptedBus::new(vec![0], u32::MAX);
    let mut adc = Hx711::new(bus, GAIN_PULSES_A128).with_poll_interval(Duration::ZERO);
    let err = adc.read(Duration::from_millis(3)).expect_err("stall");
    assert!(err.to_string().contains("timeout"));
}

proptest! {
    #[test]
    fn sign_extension_matches_twos_complement(v in 0u32..(1 << 24)) {
        let decoded = sign_extend_24(v);
        if v & 0x80_0000 == 0 {
            prop_assert_eq!(decoded, v as i32);
        } else {
            prop_assert_eq!(i64::from(decoded), i64::from(v) - (1i64 << 24));
        }
    }
}
