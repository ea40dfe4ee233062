use elektra::simcount::SimCounter;

#[test]
fn a_full_polling_sequence_accumulates_both_directions() {
    let mut counter = SimCounter::new("battery");

    // First poll establishes the reference point
    let delta = counter.sample_at(-2500.0, 1_698_224_400.0);
    assert_eq!(delta.imported_wh, 0.0);
    assert_eq!(delta.exported_wh, 0.0);

    // 10 s of 2500 W charging -> about 6.94 Wh imported
    let delta = counter.sample_at(-2500.0, 1_698_224_410.0);
    assert!((delta.imported_wh - 2500.0 * 10.0 / 3600.0).abs() < 1e-9);
    assert_eq!(delta.exported_wh, 0.0);

    // Battery flips to discharging at 1000 W for 30 s
    let delta = counter.sample_at(1000.0, 1_698_224_440.0);
    assert_eq!(delta.imported_wh, 0.0);
    assert!((delta.exported_wh - 1000.0 * 30.0 / 3600.0).abs() < 1e-9);

    let totals = counter.totals();
    assert!((totals.imported_wh - 2500.0 * 10.0 / 3600.0).abs() < 1e-9);
    assert!((totals.exported_wh - 1000.0 * 30.0 / 3600.0).abs() < 1e-9);
}

#[test]
fn zero_power_moves_time_without_energy() {
    let mut counter = SimCounter::new("battery");
    counter.sample_at(0.0, 100.0);
    let delta = counter.sample_at(0.0, 200.0);
    assert_eq!(delta.imported_wh, 0.0);
    assert_eq!(delta.exported_wh, 0.0);

    // The reference still advanced: the next sample integrates from 200 s
    let delta = counter.sample_at(3600.0, 210.0);
    assert!((delta.exported_wh - 10.0).abs() < 1e-9);
}

#[test]
fn clock_skew_never_decreases_totals() {
    let mut counter = SimCounter::new("battery");
    counter.sample_at(1800.0, 1000.0);
    counter.sample_at(1800.0, 2000.0);
    let before = counter.totals();

    let delta = counter.sample_at(-9000.0, 1500.0);
    assert_eq!(delta.imported_wh, 0.0);
    assert_eq!(delta.exported_wh, 0.0);
    assert_eq!(counter.totals(), before);
}

#[test]
fn counters_are_independent_per_component() {
    let mut bat = SimCounter::new("battery");
    let mut grid = SimCounter::new("grid");
    bat.sample_at(500.0, 0.0);
    bat.sample_at(500.0, 3600.0);
    grid.sample_at(-500.0, 0.0);
    grid.sample_at(-500.0, 3600.0);

    assert!((bat.totals().exported_wh - 500.0).abs() < 1e-9);
    assert_eq!(bat.totals().imported_wh, 0.0);
    assert!((grid.totals().imported_wh - 500.0).abs() < 1e-9);
    assert_eq!(grid.totals().exported_wh, 0.0);
}
