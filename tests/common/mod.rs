use chrono::{DateTime, Duration, Utc};
use vision_decision::models::{Bar, BarSeries};

/// Create n bars oscillating around `center`, one per 15 minutes.
pub fn btc_window(n: usize, center: f64) -> BarSeries {
    let base = DateTime::parse_from_rfc3339("2024-01-17T07:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let bars: Vec<Bar> = (0..n)
        .map(|i| {
            let wave = (i % 14) as f64;
            // up for 8 bars, down for 6
            let offset = if wave < 8.0 { wave * 40.0 } else { 320.0 - (wave - 8.0) * 50.0 };
            let open = center - 300.0 + offset;
            let close = open + 25.0;
            Bar {
                timestamp: base + Duration::minutes(15 * i as i64),
                open,
                high: close + 30.0,
                low: open - 20.0,
                close,
                volume: 100.0,
            }
        })
        .collect();

    BarSeries::new(bars)
}
