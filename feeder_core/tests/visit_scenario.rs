//! Full visits driven through the boxed `Feeder` with simulated hardware.

mod common;

use std::time::Duration;

use common::{TIMESTAMP, scripted};
use feeder_core::display::FED_LINE;
use feeder_core::{DecisionBand, VisitState};

#[test]
fn one_visit_feeds_exactly_once() {
    let mut grams = vec![0.0, 0.0, 25.0];
    grams.extend(std::iter::repeat_n(65.0, 11));
    grams.extend([3.0, 0.0]);
    let (mut feeder, h) = scripted(&grams);

    let mut states = Vec::new();
    let mut feeds = Vec::new();
    for _ in 0..grams.len() {
        let tick = feeder.step().unwrap();
        states.push(tick.state);
        if let Some(d) = tick.fed {
            feeds.push(d);
        }
    }

    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].band, DecisionBand::Ok);
    assert_eq!(feeds[0].weight_g, 65.0);
    assert_eq!(feeds[0].duration_s, 0.20);
    assert_eq!(feeder.feeds(), 1);

    use VisitState::*;
    let mut expected = vec![Idle, Idle];
    expected.extend(std::iter::repeat_n(On, 10));
    expected.extend([Stable, Fed, Idle, Idle]);
    assert_eq!(states, expected);

    // open, release, close, release
    assert_eq!(h.duties(), vec![7.0, 0.0, 2.0, 0.0]);
}

#[test]
fn stable_decision_uses_window_mean() {
    // window settles on a mean of 55.2 (LIGHT) even though later readings drift up
    let mut grams = vec![55.0; 5];
    grams.extend([55.4; 5]);
    grams.extend([95.0; 3]);
    let (mut feeder, _h) = scripted(&grams);

    let fed: Vec<_> = (0..grams.len())
        .filter_map(|_| feeder.step().unwrap().fed)
        .collect();
    assert_eq!(fed.len(), 1);
    assert_eq!(fed[0].band, DecisionBand::Light);
    assert_eq!(fed[0].weight_g, 55.2);
}

#[test]
fn dispense_tick_takes_settle_hold_and_post_feed_time() {
    let (mut feeder, h) = scripted(&[65.0; 10]);
    for _ in 0..9 {
        feeder.step().unwrap();
    }
    let before = h.clock.elapsed();
    let tick = feeder.step().unwrap();
    assert!(tick.fed.is_some());
    // 2 read gaps + settle + 0.20 s hold + settle + post-feed pause
    let expected = Duration::from_millis(40 + 350 + 200 + 350 + 800);
    assert_eq!(h.clock.elapsed() - before, expected);
}

#[test]
fn display_shows_notice_progress_and_acknowledgement() {
    let (mut feeder, h) = scripted(&[0.0, 30.0, 30.0, 30.0]);
    let (mut feeder2, h2) = scripted(&[70.0; 11]);
    for _ in 0..4 {
        feeder.step().unwrap();
    }
    for _ in 0..11 {
        feeder2.step().unwrap();
    }

    let frames = h.display.frames();
    assert_eq!(frames[0], ("W:    0.0g IDLE".into(), TIMESTAMP.into()));
    assert_eq!(frames[1], ("W:   30.0g   ON".into(), "S: 1/10 d0.0".into()));
    assert_eq!(frames.len(), 4);

    let frames = h2.display.frames();
    assert!(frames.contains(&("W:  70.0g    OK".into(), "Feed 0.20s...".into())));
    assert_eq!(frames.last().unwrap().1, FED_LINE);
}

#[test]
fn idle_refresh_is_skipped_when_weight_is_steady() {
    let (mut feeder, h) = scripted(&[1.0, 1.0, 1.0, 1.2, 1.2]);
    for _ in 0..5 {
        feeder.step().unwrap();
    }
    // first render plus the 1.0 -> 1.2 move
    assert_eq!(h.display.frames().len(), 2);
}

#[test]
fn negative_readings_are_folded_to_magnitude() {
    // reversed cell: a 30 g subject reads as -30 g
    let (mut feeder, _h) = scripted(&[-30.0]);
    let tick = feeder.step().unwrap();
    assert_eq!(tick.reading.signed_g, -30.0);
    assert_eq!(tick.reading.grams, 30.0);
    assert_eq!(tick.state, VisitState::On);
}
