use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of annotation kinds the model may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    HorizontalLine,
    TrendLine,
    ParallelChannel,
    RayLine,
    Polyline,
    Marker,
    Label,
    VerticalSpan,
}

impl DrawKind {
    pub const ALL: [DrawKind; 8] = [
        DrawKind::HorizontalLine,
        DrawKind::TrendLine,
        DrawKind::ParallelChannel,
        DrawKind::RayLine,
        DrawKind::Polyline,
        DrawKind::Marker,
        DrawKind::Label,
        DrawKind::VerticalSpan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrawKind::HorizontalLine => "horizontal_line",
            DrawKind::TrendLine => "trend_line",
            DrawKind::ParallelChannel => "parallel_channel",
            DrawKind::RayLine => "ray_line",
            DrawKind::Polyline => "polyline",
            DrawKind::Marker => "marker",
            DrawKind::Label => "label",
            DrawKind::VerticalSpan => "vertical_span",
        }
    }
}

impl fmt::Display for DrawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which coordinate family an instruction's geometry is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    /// Bar index / timestamp and price.
    #[default]
    Value,
    /// `[0,1]` chart space, y measured from the top of the image.
    Normalized,
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingMode::Value => write!(f, "value"),
            AddressingMode::Normalized => write!(f, "normalized"),
        }
    }
}

/// A single point as the model wrote it. Any subset of fields may be set;
/// whether that is enough to place the point is decided at resolution time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Already scaled into `[0,1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_norm: Option<f64>,
    /// Already scaled into `[0,1]`, 0 = top of image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_norm: Option<f64>,
}

impl AnchorPoint {
    pub fn at_bar(bar_index: usize, price: f64) -> Self {
        Self {
            bar_index: Some(bar_index),
            price: Some(price),
            ..Self::default()
        }
    }

    pub fn normalized(x_norm: f64, y_norm: f64) -> Self {
        Self {
            x_norm: Some(x_norm),
            y_norm: Some(y_norm),
            ..Self::default()
        }
    }

    pub fn has_business(&self) -> bool {
        self.bar_index.is_some() || self.timestamp.is_some() || self.price.is_some()
    }

    pub fn has_normalized(&self) -> bool {
        self.x_norm.is_some() || self.y_norm.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_business() && !self.has_normalized()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_position: Option<String>,
}

impl DrawStyle {
    /// Label text, if present and not blank.
    pub fn label(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// One shape-checked, not-yet-resolved annotation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawInstruction {
    pub kind: DrawKind,
    #[serde(default)]
    pub mode: AddressingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<AnchorPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<AnchorPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<AnchorPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AnchorPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_norm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_x_norm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x_norm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_bar_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_bar_index: Option<usize>,
    #[serde(flatten)]
    pub style: DrawStyle,
}

impl DrawInstruction {
    pub fn new(kind: DrawKind, mode: AddressingMode) -> Self {
        Self {
            kind,
            mode,
            from: None,
            to: None,
            points: Vec::new(),
            position: None,
            price: None,
            y_norm: None,
            channel_width: None,
            start_x_norm: None,
            end_x_norm: None,
            start_bar_index: None,
            end_bar_index: None,
            style: DrawStyle::default(),
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.mode == AddressingMode::Normalized
    }
}
