use elektra::tariff::{LoadingWindow, PriceSeries, select_loading_hours};

/// Hourly day-ahead prices as delivered by a tariff provider
fn day_ahead_prices() -> PriceSeries {
    [
        (1698224400, 0.00012499),
        (1698228000, 0.00011738),
        (1698231600, 0.00011562),
        (1698235200, 0.00012447),
        (1698238800, 0.00013813),
        (1698242400, 0.00014751),
        (1698246000, 0.00015373),
        (1698249600, 0.00015462),
        (1698253200, 0.00015771),
        (1698256800, 0.00013708),
        (1698260400, 0.00012355),
        (1698264000, 0.00012006),
        (1698267600, 0.00011280),
    ]
    .into_iter()
    .collect()
}

#[test]
fn cheapest_hour_of_the_day() {
    let window = LoadingWindow {
        start: 1698224400,
        end: 1698235200,
        duration_hours: 1,
    };
    assert_eq!(
        select_loading_hours(&day_ahead_prices(), &window),
        vec![1698231600]
    );
}

#[test]
fn multi_hour_plan_is_ordered_by_time_not_price() {
    let window = LoadingWindow {
        start: 1698224400,
        end: 1698238800,
        duration_hours: 2,
    };
    assert_eq!(
        select_loading_hours(&day_ahead_prices(), &window),
        vec![1698228000, 1698231600]
    );
}

#[test]
fn plan_over_the_full_series_picks_global_minima() {
    let window = LoadingWindow {
        start: 1698224400,
        end: 1698267600 + 3600,
        duration_hours: 3,
    };
    // Cheapest three hours overall: 0.00011280, 0.00011562, 0.00011738
    assert_eq!(
        select_loading_hours(&day_ahead_prices(), &window),
        vec![1698228000, 1698231600, 1698267600]
    );
}

#[test]
fn sparse_series_with_gaps_only_offers_priced_hours() {
    let series: PriceSeries = [(1698224400, 0.2), (1698231600, 0.1)].into_iter().collect();
    let window = LoadingWindow {
        start: 1698224400,
        end: 1698238800,
        duration_hours: 3,
    };
    // The gap hour 1698228000 has no data and is never selected
    assert_eq!(
        select_loading_hours(&series, &window),
        vec![1698224400, 1698231600]
    );
}

#[test]
fn empty_window_yields_empty_plan() {
    let window = LoadingWindow {
        start: 1700000000,
        end: 1700003600,
        duration_hours: 2,
    };
    assert!(select_loading_hours(&day_ahead_prices(), &window).is_empty());
}

#[test]
fn series_from_provider_payload_round_trips_into_a_plan() {
    let payload = serde_json::json!({
        "1698224400": 0.00012499,
        "1698228000": 0.00011738,
        "1698231600": 0.00011562,
        "1698235200": 0.00012447,
    });
    let series = PriceSeries::from_json_object(payload.as_object().unwrap()).unwrap();
    let window = LoadingWindow {
        start: 1698224400,
        end: 1698238800,
        duration_hours: 1,
    };
    assert_eq!(select_loading_hours(&series, &window), vec![1698231600]);
}
