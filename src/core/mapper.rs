use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::error::PipelineError;
use crate::models::{BarSeries, ResolvedPoint};

pub const DEFAULT_PADDING_RATIO: f64 = 0.05;

/// Maps between business coordinates (time, price) and chart space for one
/// bar window.
///
/// Two y conventions live here and must not be merged:
/// - `value_to_normalized` returns y with 0 = lowest price, 1 = highest.
/// - `normalized_to_value` reads y the way image consumers write it,
///   0 = top of the image (highest price), 1 = bottom.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    timestamps: Vec<DateTime<Utc>>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    min_price: f64,
    max_price: f64,
    width: u32,
    height: u32,
}

impl CoordinateMapper {
    pub fn new(bars: &BarSeries, width: u32, height: u32) -> Result<Self, PipelineError> {
        Self::with_padding(bars, width, height, DEFAULT_PADDING_RATIO)
    }

    pub fn with_padding(
        bars: &BarSeries,
        width: u32,
        height: u32,
        padding_ratio: f64,
    ) -> Result<Self, PipelineError> {
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(PipelineError::EmptyChartDomain);
        };
        if !bars.is_chronological() {
            warn!(bars = bars.len(), "bar window is not in time order; nearest-bar lookups may be off");
        }

        let low = bars.lows_min();
        let high = bars.highs_max();
        let pad = (high - low) * padding_ratio.max(0.0);

        Ok(Self {
            timestamps: bars.timestamps(),
            start_time: first.timestamp,
            end_time: last.timestamp,
            min_price: low - pad,
            max_price: high + pad,
            width,
            height,
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn min_price(&self) -> f64 {
        self.min_price
    }

    pub fn max_price(&self) -> f64 {
        self.max_price
    }

    pub fn bars_count(&self) -> usize {
        self.timestamps.len()
    }

    fn time_span_ms(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64
    }

    fn price_span(&self) -> f64 {
        self.max_price - self.min_price
    }

    /// `(x, y)` in `[0,1]`, y measured upward from the lowest price.
    /// Degenerate axes map to 0.5.
    pub fn value_to_normalized(&self, timestamp: DateTime<Utc>, price: f64) -> (f64, f64) {
        let span = self.time_span_ms();
        let x = if span <= 0.0 {
            0.5
        } else {
            ((timestamp - self.start_time).num_milliseconds() as f64 / span).clamp(0.0, 1.0)
        };

        let range = self.price_span();
        let y = if range <= 0.0 {
            0.5
        } else {
            ((price - self.min_price) / range).clamp(0.0, 1.0)
        };
        (x, y)
    }

    /// Inverse for time. For price, y = 0 is the top of the image (highest
    /// price) and y = 1 the bottom.
    pub fn normalized_to_value(&self, x_norm: f64, y_norm: f64) -> (DateTime<Utc>, f64) {
        let x = x_norm.clamp(0.0, 1.0);
        let y = y_norm.clamp(0.0, 1.0);
        let offset = Duration::milliseconds((x * self.time_span_ms()).round() as i64);
        let price = self.max_price - y * self.price_span();
        (self.start_time + offset, price)
    }

    pub fn bar_index_to_time(&self, index: usize) -> Option<DateTime<Utc>> {
        self.timestamps.get(index).copied()
    }

    /// Index of the bar nearest to `t`. Ties go to the earlier bar.
    pub fn time_to_bar_index(&self, t: DateTime<Utc>) -> usize {
        let ts = &self.timestamps;
        let idx = ts.partition_point(|bar_time| *bar_time < t);
        if idx == 0 {
            return 0;
        }
        if idx >= ts.len() {
            return ts.len() - 1;
        }
        let before = t - ts[idx - 1];
        let after = ts[idx] - t;
        if after < before {
            idx
        } else {
            idx - 1
        }
    }

    /// Bar index addressed by a normalized x, spread evenly over the window.
    pub fn x_norm_to_bar_index(&self, x_norm: f64) -> usize {
        let last = self.bars_count().saturating_sub(1);
        (x_norm.clamp(0.0, 1.0) * last as f64).round() as usize
    }

    /// Pixel column of a bar. Indices past the window extrapolate.
    pub fn bar_index_to_pixel_x(&self, index: usize) -> f64 {
        let last = self.bars_count().saturating_sub(1);
        let x = if last == 0 {
            0.5
        } else {
            index as f64 / last as f64
        };
        x * self.width as f64
    }

    /// Pixel row of a price, top-left origin. Not clamped to the image.
    pub fn price_to_pixel_y(&self, price: f64) -> f64 {
        let range = self.price_span();
        let up = if range <= 0.0 {
            0.5
        } else {
            (price - self.min_price) / range
        };
        (1.0 - up) * self.height as f64
    }

    pub fn to_pixel(&self, point: ResolvedPoint) -> (f64, f64) {
        (
            self.bar_index_to_pixel_x(point.bar_index),
            self.price_to_pixel_y(point.price),
        )
    }
}
