use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::DrawInstruction;

/// Leverage applied when the model gave none.
pub const DEFAULT_LEVERAGE: f64 = 1.0;

/// A value normalized through a synonym table. Words the table does not know
/// are kept verbatim so callers can see what the model actually said.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Known(T),
    Unrecognized(String),
}

impl<T> Lenient<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Lenient::Known(v) => Some(v),
            Lenient::Unrecognized(_) => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Lenient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lenient::Known(v) => write!(f, "{}", v),
            Lenient::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    BelowAverage,
    Average,
    AboveAverage,
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrengthLevel::BelowAverage => write!(f, "below_average"),
            StrengthLevel::Average => write!(f, "average"),
            StrengthLevel::AboveAverage => write!(f, "above_average"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryPrice {
    Market,
    Limit(f64),
}

impl Serialize for EntryPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntryPrice::Market => serializer.serialize_str("market"),
            EntryPrice::Limit(p) => serializer.serialize_f64(*p),
        }
    }
}

impl<'de> Deserialize<'de> for EntryPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(p) => Ok(EntryPrice::Limit(p)),
            Raw::Text(s) if s.eq_ignore_ascii_case("market") => Ok(EntryPrice::Market),
            Raw::Text(other) => Err(D::Error::custom(format!(
                "expected a number or \"market\", got {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorView {
    pub bias: Lenient<Trend>,
    #[serde(default)]
    pub note: String,
}

impl Default for IndicatorView {
    fn default() -> Self {
        Self {
            bias: Lenient::Known(Trend::Neutral),
            note: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendStrengthView {
    pub level: Lenient<StrengthLevel>,
    pub bias: Lenient<Trend>,
    #[serde(default)]
    pub note: String,
}

impl Default for TrendStrengthView {
    fn default() -> Self {
        Self {
            level: Lenient::Known(StrengthLevel::Average),
            bias: Lenient::Known(Trend::Neutral),
            note: String::new(),
        }
    }
}

/// The model's reading of the indicator panels drawn under the chart.
/// `rsi` is the oscillator, `macd` the momentum panel and `trend_strength`
/// the ADX panel; anything else the model volunteers lands in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorViews {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<IndicatorView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<IndicatorView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_strength: Option<TrendStrengthView>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, IndicatorView>,
}

impl IndicatorViews {
    pub fn is_empty(&self) -> bool {
        self.rsi.is_none()
            && self.macd.is_none()
            && self.trend_strength.is_none()
            && self.other.is_empty()
    }
}

/// A validated trading decision. Draw instructions are still unresolved
/// here; see `core::resolver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub enter: bool,
    pub direction: Option<Lenient<Direction>>,
    pub position_size: f64,
    /// `None` when the model gave no usable leverage. The default is applied
    /// separately by `leverage_or` / `effective_leverage`.
    pub leverage: Option<f64>,
    pub confidence: f64,
    pub entry_price: Option<EntryPrice>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub reason: String,
    #[serde(default)]
    pub indicator_views: IndicatorViews,
    #[serde(default)]
    pub draw_instructions: Vec<DrawInstruction>,
}

impl Decision {
    pub fn leverage_or(&self, default: f64) -> f64 {
        self.leverage.unwrap_or(default)
    }

    pub fn effective_leverage(&self) -> f64 {
        self.leverage_or(DEFAULT_LEVERAGE)
    }

    /// The recognized trade direction, if any.
    pub fn side(&self) -> Option<Direction> {
        self.direction.as_ref().and_then(|d| d.known().copied())
    }

    /// Direction as the string downstream consumers see, including
    /// unrecognized words.
    pub fn direction_str(&self) -> Option<&str> {
        match self.direction.as_ref()? {
            Lenient::Known(d) => Some(d.as_str()),
            Lenient::Unrecognized(raw) => Some(raw.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_decision() -> Decision {
        Decision {
            enter: false,
            direction: None,
            position_size: 0.0,
            leverage: None,
            confidence: 0.0,
            entry_price: None,
            stop_loss: None,
            take_profit: None,
            reason: String::new(),
            indicator_views: IndicatorViews::default(),
            draw_instructions: Vec::new(),
        }
    }

    #[test]
    fn lenient_serializes_as_plain_string() {
        let known: Lenient<Direction> = Lenient::Known(Direction::Short);
        let raw: Lenient<Direction> = Lenient::Unrecognized("hedge".to_string());
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"short\"");
        assert_eq!(serde_json::to_string(&raw).unwrap(), "\"hedge\"");

        let back: Lenient<Direction> = serde_json::from_str("\"hedge\"").unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn entry_price_wire_forms() {
        assert_eq!(serde_json::to_string(&EntryPrice::Market).unwrap(), "\"market\"");
        assert_eq!(serde_json::to_string(&EntryPrice::Limit(86850.0)).unwrap(), "86850.0");

        let m: EntryPrice = serde_json::from_str("\"MARKET\"").unwrap();
        assert_eq!(m, EntryPrice::Market);
        assert!(serde_json::from_str::<EntryPrice>("\"soon\"").is_err());
    }

    #[test]
    fn leverage_default_is_separate_step() {
        let mut d = bare_decision();
        assert!(d.leverage.is_none());
        assert!((d.effective_leverage() - 1.0).abs() < 1e-9);
        assert!((d.leverage_or(3.0) - 3.0).abs() < 1e-9);

        d.leverage = Some(5.0);
        assert!((d.effective_leverage() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn direction_accessors() {
        let mut d = bare_decision();
        assert_eq!(d.direction_str(), None);

        d.direction = Some(Lenient::Known(Direction::Long));
        assert_eq!(d.side(), Some(Direction::Long));
        assert_eq!(d.direction_str(), Some("long"));

        d.direction = Some(Lenient::Unrecognized("sideways".to_string()));
        assert_eq!(d.side(), None);
        assert_eq!(d.direction_str(), Some("sideways"));
    }
}
