use serde::{Deserialize, Serialize};

use crate::models::{DrawKind, DrawStyle};

/// A fully placed point on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPoint {
    pub bar_index: usize,
    pub price: f64,
}

impl ResolvedPoint {
    pub fn new(bar_index: usize, price: f64) -> Self {
        Self { bar_index, price }
    }
}

/// An annotation with concrete geometry, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolvedOverlay {
    HorizontalLine {
        price: f64,
        #[serde(flatten)]
        style: DrawStyle,
    },
    TrendLine {
        start: ResolvedPoint,
        end: ResolvedPoint,
        #[serde(flatten)]
        style: DrawStyle,
    },
    ParallelChannel {
        start: ResolvedPoint,
        end: ResolvedPoint,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel_width: Option<f64>,
        #[serde(flatten)]
        style: DrawStyle,
    },
    RayLine {
        start: ResolvedPoint,
        /// Second point giving the ray its slope; horizontal when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        through: Option<ResolvedPoint>,
        #[serde(flatten)]
        style: DrawStyle,
    },
    Polyline {
        points: Vec<ResolvedPoint>,
        #[serde(flatten)]
        style: DrawStyle,
    },
    Marker {
        position: ResolvedPoint,
        #[serde(flatten)]
        style: DrawStyle,
    },
    Label {
        position: ResolvedPoint,
        #[serde(flatten)]
        style: DrawStyle,
    },
    VerticalSpan {
        start_bar_index: usize,
        end_bar_index: usize,
        #[serde(flatten)]
        style: DrawStyle,
    },
}

impl ResolvedOverlay {
    pub fn kind(&self) -> DrawKind {
        match self {
            ResolvedOverlay::HorizontalLine { .. } => DrawKind::HorizontalLine,
            ResolvedOverlay::TrendLine { .. } => DrawKind::TrendLine,
            ResolvedOverlay::ParallelChannel { .. } => DrawKind::ParallelChannel,
            ResolvedOverlay::RayLine { .. } => DrawKind::RayLine,
            ResolvedOverlay::Polyline { .. } => DrawKind::Polyline,
            ResolvedOverlay::Marker { .. } => DrawKind::Marker,
            ResolvedOverlay::Label { .. } => DrawKind::Label,
            ResolvedOverlay::VerticalSpan { .. } => DrawKind::VerticalSpan,
        }
    }
}

/// Text to composite onto the rendered image next to a horizontal level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub price: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Pixel row of `price` in the render target, top-left origin.
    pub y_pixel: f64,
}

/// Everything one resolution pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayBatch {
    pub overlays: Vec<ResolvedOverlay>,
    pub annotations: Vec<TextAnnotation>,
    /// Number of instructions dropped because they could not be placed.
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlays_serialize_with_type_tag_and_flat_style() {
        let overlay = ResolvedOverlay::HorizontalLine {
            price: 86800.0,
            style: DrawStyle {
                color: Some("#22c55e".to_string()),
                text: Some("Support".to_string()),
                ..DrawStyle::default()
            },
        };
        let v = serde_json::to_value(&overlay).unwrap();
        assert_eq!(v["type"], "horizontal_line");
        assert_eq!(v["price"], 86800.0);
        assert_eq!(v["color"], "#22c55e");
        assert_eq!(v["text"], "Support");
        assert_eq!(overlay.kind(), DrawKind::HorizontalLine);
    }
}
