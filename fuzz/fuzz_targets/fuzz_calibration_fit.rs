#![no_main]
use feeder_config::{CalibrationCfg, CalibrationRow};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|pts: Vec<(i32, f32)>| {
    let rows: Vec<CalibrationRow> = pts
        .into_iter()
        .map(|(raw, grams)| CalibrationRow {
            raw: i64::from(raw),
            grams: f64::from(grams),
        })
        .collect();
    // any accepted fit must be usable as a calibration
    if let Ok(cal) = CalibrationCfg::from_rows(rows) {
        assert!(cal.scale.is_finite() && cal.scale != 0.0);
        assert!(cal.offset.is_finite());
    }
});
