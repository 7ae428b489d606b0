use chrono::{DateTime, Duration, Utc};

use crate::config::PipelineConfig;
use crate::models::{Bar, BarSeries};

/// First bar of every fixture window. Bars are one minute apart.
fn window_start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// The window a chart image was rendered from, given as (open, high, low, close).
pub fn ohlc_window(ohlc: &[(f64, f64, f64, f64)]) -> BarSeries {
    let start = window_start();
    ohlc.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: start + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume: 100.0,
        })
        .collect::<Vec<_>>()
        .into()
}

/// A steadily climbing window: each bar opens 10 above the last, closes 8
/// above its open, wicks 2 above the close and 1 below the open. The chart's
/// price domain is therefore `[base - 1, base + 10 * (n - 1) + 10]`.
pub fn climbing_window(n: usize, base: f64) -> BarSeries {
    let ohlc: Vec<_> = (0..n)
        .map(|i| {
            let open = base + 10.0 * i as f64;
            (open, open + 10.0, open - 1.0, open + 8.0)
        })
        .collect();
    ohlc_window(&ohlc)
}

/// A config with a fixed render target, independent of the environment.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        chart_width: 1000,
        chart_height: 500,
        log_level: "error".to_string(),
        dump_dir: std::env::temp_dir()
            .join("vision_decision_test")
            .to_string_lossy()
            .to_string(),
        ..PipelineConfig::default()
    }
}
