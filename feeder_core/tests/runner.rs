mod common;

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use common::{OFFSET, SCALE, builder_for, scripted};
use feeder_core::error::FeederError;
use feeder_core::{RunParams, run};
use feeder_hardware::SimulatedLoadCell;
use rstest::rstest;

fn params(max_ticks: Option<u64>, max_stalls: u32) -> RunParams {
    RunParams {
        tick: Duration::from_millis(150),
        max_ticks,
        max_consecutive_stalls: max_stalls,
        banner_hold: Duration::ZERO,
        shutdown_hold: Duration::ZERO,
    }
}

#[rstest]
fn runs_a_visit_and_closes_the_gate() {
    let mut grams = vec![0.0, 0.0, 25.0];
    grams.extend(std::iter::repeat_n(65.0, 11));
    grams.extend([3.0, 0.0]);
    let (mut feeder, h) = scripted(&grams);

    let summary = run(&mut feeder, &params(Some(16), 20), &AtomicBool::new(false)).unwrap();
    assert_eq!(summary.ticks, 16);
    assert_eq!(summary.feeds, 1);
    assert_eq!(summary.stalls, 0);

    // startup close, the dispense cycle, shutdown close
    let duties = h.duties();
    assert_eq!(&duties[..2], &[2.0, 0.0]);
    assert_eq!(&duties[2..6], &[7.0, 0.0, 2.0, 0.0]);
    assert_eq!(&duties[6..], &[2.0, 0.0]);

    let frames = h.display.frames();
    assert_eq!(frames.first().unwrap().0, "Pet Feeder");
    let n = frames.len();
    assert_eq!(frames[n - 2].0, "Stopped");
    assert_eq!(frames[n - 1], (String::new(), String::new()));
}

#[rstest]
fn shutdown_message_is_held_then_cleared() {
    let (mut feeder, h) = scripted(&[0.0]);
    let params = RunParams {
        shutdown_hold: Duration::from_millis(600),
        ..params(None, 20)
    };
    run(&mut feeder, &params, &AtomicBool::new(true)).unwrap();

    let frames = h.display.frames();
    let firsts: Vec<&str> = frames.iter().map(|f| f.0.as_str()).collect();
    assert_eq!(firsts, vec!["Pet Feeder", "Stopped", ""]);
    // startup close + shutdown close + the held message
    assert_eq!(h.clock.elapsed(), Duration::from_millis(2 * 350 + 600));
    assert_eq!(h.clock.sleeps().last(), Some(&Duration::from_millis(600)));
}

#[rstest]
fn shutdown_flag_stops_before_the_first_tick() {
    let (mut feeder, h) = scripted(&[50.0]);
    let summary = run(&mut feeder, &params(None, 20), &AtomicBool::new(true)).unwrap();
    assert_eq!(summary.ticks, 0);
    assert_eq!(h.duties(), vec![2.0, 0.0, 2.0, 0.0]);
}

#[rstest]
fn consecutive_stalls_abort_with_timeout() {
    let (builder, h) = builder_for(SimulatedLoadCell::new(OFFSET, SCALE).stalled());
    let mut feeder = builder.build().unwrap();

    let err = run(&mut feeder, &params(None, 3), &AtomicBool::new(false)).unwrap_err();
    assert!(
        err.chain()
            .any(|c| c.downcast_ref::<FeederError>() == Some(&FeederError::Timeout)),
        "{err:?}"
    );
    assert!(format!("{err}").contains("3 consecutive ticks"));
    // gate closed on the error path too
    assert_eq!(h.duties().last(), Some(&0.0));
    assert_eq!(h.duties().len(), 4);
}

#[rstest]
fn stalls_are_counted_when_abort_is_disabled() {
    let (builder, _h) = builder_for(SimulatedLoadCell::new(OFFSET, SCALE).stalled());
    let mut feeder = builder.build().unwrap();

    let summary = run(&mut feeder, &params(Some(5), 0), &AtomicBool::new(false)).unwrap();
    assert_eq!(summary.ticks, 5);
    assert_eq!(summary.stalls, 5);
    assert_eq!(summary.feeds, 0);
}

#[rstest]
fn ticks_are_paced_by_the_clock() {
    let (mut feeder, h) = scripted(&[0.0]);
    run(&mut feeder, &params(Some(4), 20), &AtomicBool::new(false)).unwrap();
    // two gate moves (start + stop) + 4 x (2 read gaps + tick)
    let expected = Duration::from_millis(2 * 350 + 4 * (40 + 150));
    assert_eq!(h.clock.elapsed(), expected);
}
