//! Lenient schema normalization from model JSON to a typed `Decision`.
//!
//! Rules applied, in field order:
//! - `enter`: booleans, `0/1` and `"true"/"yes"/"1"` style strings; anything
//!   else is `false`.
//! - `direction`: looked up in `synonyms::DIRECTIONS`; flat words become
//!   `None`, unknown words are kept as `Lenient::Unrecognized`.
//! - `position_size`, `confidence`: numeric (or numeric string), clamped to
//!   `[0,1]`, `0` when missing.
//! - `leverage`: positive numbers only (`"10x"` is read as 10). Zero,
//!   negatives, empty strings and `"none"`/`"null"` become `None`; the
//!   default of 1 is applied later by `Decision::effective_leverage`.
//! - `entry_price`: `"market"` is kept, numeric strings are parsed, anything
//!   else becomes `None`.
//! - `indicator_views`: bias and trend-strength level go through their
//!   synonym tables with passthrough.
//! - `draw_instructions`: shape only. The kind must be known and optional
//!   fields must have the right JSON type. Whether the anchors are enough to
//!   place the shape is left to the resolver.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::synonyms::{ADDRESSING_MODES, BIASES, DIRECTIONS, DRAW_KINDS, STRENGTH_LEVELS};
use crate::error::DecisionError;
use crate::models::{
    AddressingMode, AnchorPoint, Decision, Direction, DrawInstruction, DrawStyle, EntryPrice,
    IndicatorView, IndicatorViews, Lenient, StrengthLevel, Trend, TrendStrengthView,
};

type Object = Map<String, Value>;
type Result<T> = std::result::Result<T, DecisionError>;

const BAR_INDEX_KEYS: &[&str] = &["bar_index", "index", "bar"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "ts"];
const X_NORM_KEYS: &[&str] = &["x_norm", "x"];
const Y_NORM_KEYS: &[&str] = &["y_norm", "y"];

/// Unix timestamps above this are taken to be milliseconds.
const MILLIS_THRESHOLD: f64 = 1e11;

pub fn validate(json: &str) -> Result<Decision> {
    let root: Value = serde_json::from_str(json)?;
    validate_value(&root)
}

pub fn validate_value(root: &Value) -> Result<Decision> {
    let obj = root.as_object().ok_or_else(|| {
        DecisionError::schema("$", format!("expected an object, got {}", type_name(root)))
    })?;

    let decision = Decision {
        enter: coerce_bool(obj.get("enter")),
        direction: normalize_direction(obj.get("direction"))?,
        position_size: unit_interval(obj.get("position_size")),
        leverage: normalize_leverage(obj.get("leverage")),
        confidence: unit_interval(obj.get("confidence")),
        entry_price: normalize_entry_price(obj.get("entry_price")),
        stop_loss: lookup(obj, &["stop_loss_price", "stop_loss"]).and_then(|(_, v)| coerce_number(v)),
        take_profit: lookup(obj, &["take_profit_price", "take_profit"])
            .and_then(|(_, v)| coerce_number(v)),
        reason: optional_string(obj, "reason", "reason")?.unwrap_or_default(),
        indicator_views: parse_indicator_views(obj.get("indicator_views"))?,
        draw_instructions: parse_draw_instructions(obj.get("draw_instructions"))?,
    };

    debug!(
        enter = decision.enter,
        direction = decision.direction_str().unwrap_or("none"),
        instructions = decision.draw_instructions.len(),
        "validated decision"
    );
    Ok(decision)
}

// ---------------------------------------------------------------------------
// scalar coercions
// ---------------------------------------------------------------------------

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce_bool(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "是"
        ),
        _ => false,
    }
}

/// Numbers and numeric strings (`"86,850"`, `"$86850.5"`) to a finite f64.
fn coerce_number(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn unit_interval(v: Option<&Value>) -> f64 {
    v.and_then(coerce_number).unwrap_or(0.0).clamp(0.0, 1.0)
}

fn normalize_leverage(v: Option<&Value>) -> Option<f64> {
    let lev = match v? {
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            if matches!(s.as_str(), "" | "none" | "null" | "n/a") {
                return None;
            }
            s.trim_end_matches('x').trim().parse::<f64>().ok()?
        }
        other => coerce_number(other)?,
    };
    (lev.is_finite() && lev > 0.0).then_some(lev)
}

fn normalize_entry_price(v: Option<&Value>) -> Option<EntryPrice> {
    match v? {
        Value::String(s) if s.trim().eq_ignore_ascii_case("market") => Some(EntryPrice::Market),
        other => coerce_number(other).map(EntryPrice::Limit),
    }
}

fn normalize_direction(v: Option<&Value>) -> Result<Option<Lenient<Direction>>> {
    let raw = match v {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Bool(_) | Value::Number(_))) => v.to_string(),
        Some(other) => {
            return Err(DecisionError::schema(
                "direction",
                format!("expected string, got {}", type_name(other)),
            ))
        }
    };
    Ok(match DIRECTIONS.lookup(&raw) {
        Some(side) => side.map(Lenient::Known),
        None => Some(Lenient::Unrecognized(raw.trim().to_string())),
    })
}

/// Values at or below this are unit-range overshoots, not 0..1000 coordinates.
const THOUSAND_SCALE_FLOOR: f64 = 2.0;

/// Scale a normalized coordinate into `[0,1]`, accepting the 0..1000 form.
/// A small overshoot past the edge (`1.02`) clamps to that edge.
pub(crate) fn scale_norm(v: f64) -> f64 {
    let v = if v > THOUSAND_SCALE_FLOOR { v / 1000.0 } else { v };
    v.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// typed field access
// ---------------------------------------------------------------------------

/// First of `keys` present with a non-null value.
fn lookup<'a>(obj: &'a Object, keys: &[&'static str]) -> Option<(&'static str, &'a Value)> {
    keys.iter().find_map(|k| match obj.get(*k) {
        None | Some(Value::Null) => None,
        Some(v) => Some((*k, v)),
    })
}

fn join(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

fn optional_string(obj: &Object, key: &str, path: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Bool(_) | Value::Number(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(DecisionError::schema(
            path,
            format!("expected string, got {}", type_name(other)),
        )),
    }
}

fn number_at(v: &Value, path: &str) -> Result<f64> {
    coerce_number(v).ok_or_else(|| match v {
        Value::String(s) => DecisionError::schema(path, format!("expected number, got {:?}", s)),
        other => DecisionError::schema(path, format!("expected number, got {}", type_name(other))),
    })
}

fn optional_number(obj: &Object, keys: &[&'static str], path: &str) -> Result<Option<f64>> {
    lookup(obj, keys)
        .map(|(k, v)| number_at(v, &join(path, k)))
        .transpose()
}

fn index_at(v: &Value, path: &str) -> Result<usize> {
    let f = number_at(v, path)?;
    if f < 0.0 {
        return Err(DecisionError::schema(path, format!("bar index must be non-negative, got {}", f)));
    }
    Ok(f.round() as usize)
}

fn optional_index(obj: &Object, keys: &[&'static str], path: &str) -> Result<Option<usize>> {
    lookup(obj, keys)
        .map(|(k, v)| index_at(v, &join(path, k)))
        .transpose()
}

fn timestamp_at(v: &Value, path: &str) -> Result<DateTime<Utc>> {
    let parsed = match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_f64().and_then(|f| {
            let millis = if f.abs() > MILLIS_THRESHOLD { f } else { f * 1000.0 };
            Utc.timestamp_millis_opt(millis.round() as i64).single()
        }),
        _ => None,
    };
    parsed.ok_or_else(|| {
        DecisionError::schema(path, format!("expected RFC 3339 or unix timestamp, got {}", v))
    })
}

// ---------------------------------------------------------------------------
// indicator views
// ---------------------------------------------------------------------------

fn parse_bias(obj: &Object, path: &str) -> Result<Lenient<Trend>> {
    Ok(match optional_string(obj, "bias", &join(path, "bias"))? {
        Some(s) => BIASES.normalize(&s),
        None => Lenient::Known(Trend::Neutral),
    })
}

fn parse_indicator_view(v: &Value, path: &str) -> Result<IndicatorView> {
    match v {
        // a bare string is read as the bias
        Value::String(s) => Ok(IndicatorView {
            bias: BIASES.normalize(s),
            note: String::new(),
        }),
        Value::Object(obj) => Ok(IndicatorView {
            bias: parse_bias(obj, path)?,
            note: optional_string(obj, "note", &join(path, "note"))?.unwrap_or_default(),
        }),
        other => Err(DecisionError::schema(
            path,
            format!("expected object, got {}", type_name(other)),
        )),
    }
}

fn parse_trend_strength(v: &Value, path: &str) -> Result<TrendStrengthView> {
    let obj = match v {
        // a bare string is read as the level
        Value::String(s) => {
            return Ok(TrendStrengthView {
                level: STRENGTH_LEVELS.normalize(s),
                bias: Lenient::Known(Trend::Neutral),
                note: String::new(),
            })
        }
        Value::Object(obj) => obj,
        other => {
            return Err(DecisionError::schema(
                path,
                format!("expected object, got {}", type_name(other)),
            ))
        }
    };
    let level = match optional_string(obj, "level", &join(path, "level"))? {
        Some(s) => STRENGTH_LEVELS.normalize(&s),
        None => Lenient::Known(StrengthLevel::Average),
    };
    Ok(TrendStrengthView {
        level,
        bias: parse_bias(obj, path)?,
        note: optional_string(obj, "note", &join(path, "note"))?.unwrap_or_default(),
    })
}

fn parse_indicator_views(v: Option<&Value>) -> Result<IndicatorViews> {
    let obj = match v {
        None | Some(Value::Null) => return Ok(IndicatorViews::default()),
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            return Err(DecisionError::schema(
                "indicator_views",
                format!("expected object, got {}", type_name(other)),
            ))
        }
    };

    let mut views = IndicatorViews::default();
    for (name, value) in obj {
        if value.is_null() {
            continue;
        }
        let path = join("indicator_views", name);
        match name.to_lowercase().as_str() {
            "rsi" => views.rsi = Some(parse_indicator_view(value, &path)?),
            "macd" => views.macd = Some(parse_indicator_view(value, &path)?),
            "trend_strength" | "adx" => {
                views.trend_strength = Some(parse_trend_strength(value, &path)?)
            }
            _ => {
                views
                    .other
                    .insert(name.clone(), parse_indicator_view(value, &path)?);
            }
        }
    }
    Ok(views)
}

// ---------------------------------------------------------------------------
// draw instructions
// ---------------------------------------------------------------------------

fn parse_draw_instructions(v: Option<&Value>) -> Result<Vec<DrawInstruction>> {
    let items = match v {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(DecisionError::schema(
                "draw_instructions",
                format!("expected array, got {}", type_name(other)),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("draw_instructions[{}]", i);
            let obj = item.as_object().ok_or_else(|| {
                DecisionError::schema(&path, format!("expected object, got {}", type_name(item)))
            })?;
            parse_instruction(obj, &path)
        })
        .collect()
}

fn has_any(obj: &Object, keys: &[&str]) -> bool {
    keys.iter().any(|k| obj.get(*k).is_some_and(|v| !v.is_null()))
}

/// Mode for instructions that do not state one: normalized only when
/// normalized coordinates are the only geometry present.
fn infer_mode(obj: &Object) -> AddressingMode {
    const NORM_TOP: &[&str] = &["y_norm", "start_x_norm", "end_x_norm"];
    const VALUE_TOP: &[&str] = &["price", "start_bar_index", "end_bar_index"];

    let mut saw_norm = has_any(obj, NORM_TOP);
    let mut saw_value = has_any(obj, VALUE_TOP);

    let nested = ["from", "to", "position"]
        .iter()
        .filter_map(|k| obj.get(*k))
        .chain(obj.get("points").and_then(Value::as_array).into_iter().flatten());
    for anchor in nested {
        if let Value::Object(a) = anchor {
            saw_norm |= has_any(a, X_NORM_KEYS) || has_any(a, Y_NORM_KEYS);
            saw_value |= has_any(a, BAR_INDEX_KEYS) || has_any(a, TIMESTAMP_KEYS) || has_any(a, &["price"]);
        }
    }

    if saw_norm && !saw_value {
        AddressingMode::Normalized
    } else {
        AddressingMode::Value
    }
}

fn parse_mode(obj: &Object, path: &str) -> Result<AddressingMode> {
    let Some(raw) = optional_string(obj, "mode", &join(path, "mode"))? else {
        return Ok(infer_mode(obj));
    };
    Ok(ADDRESSING_MODES.lookup(&raw).unwrap_or_else(|| {
        let inferred = infer_mode(obj);
        debug!(path, mode = %raw, %inferred, "unknown addressing mode, inferring from fields");
        inferred
    }))
}

fn parse_anchor(v: &Value, mode: AddressingMode, path: &str) -> Result<AnchorPoint> {
    match v {
        Value::Object(obj) => {
            let timestamp = lookup(obj, TIMESTAMP_KEYS)
                .map(|(k, v)| timestamp_at(v, &join(path, k)))
                .transpose()?;
            Ok(AnchorPoint {
                bar_index: optional_index(obj, BAR_INDEX_KEYS, path)?,
                timestamp,
                price: optional_number(obj, &["price"], path)?,
                x_norm: optional_number(obj, X_NORM_KEYS, path)?.map(scale_norm),
                y_norm: optional_number(obj, Y_NORM_KEYS, path)?.map(scale_norm),
            })
        }
        Value::Array(pair) if pair.len() == 2 => {
            let a_path = format!("{}[0]", path);
            let b_path = format!("{}[1]", path);
            Ok(match mode {
                AddressingMode::Value => AnchorPoint::at_bar(
                    index_at(&pair[0], &a_path)?,
                    number_at(&pair[1], &b_path)?,
                ),
                AddressingMode::Normalized => AnchorPoint::normalized(
                    scale_norm(number_at(&pair[0], &a_path)?),
                    scale_norm(number_at(&pair[1], &b_path)?),
                ),
            })
        }
        other => Err(DecisionError::schema(
            path,
            format!("expected anchor object or [a, b] pair, got {}", other),
        )),
    }
}

fn optional_anchor(
    obj: &Object,
    key: &str,
    mode: AddressingMode,
    path: &str,
) -> Result<Option<AnchorPoint>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => parse_anchor(v, mode, &join(path, key)).map(Some),
    }
}

fn parse_instruction(obj: &Object, path: &str) -> Result<DrawInstruction> {
    let kind_path = join(path, "type");
    let raw_kind = match lookup(obj, &["type", "kind"]) {
        Some((_, Value::String(s))) => s,
        Some((_, other)) => {
            return Err(DecisionError::schema(
                kind_path,
                format!("expected string, got {}", type_name(other)),
            ))
        }
        None => return Err(DecisionError::schema(kind_path, "missing draw instruction type")),
    };
    let kind = DRAW_KINDS
        .lookup(raw_kind)
        .ok_or_else(|| DecisionError::schema(&kind_path, format!("unknown kind {:?}", raw_kind)))?;
    let mode = parse_mode(obj, path)?;

    let points = match obj.get("points") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, p)| parse_anchor(p, mode, &format!("{}.points[{}]", path, i)))
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(DecisionError::schema(
                join(path, "points"),
                format!("expected array, got {}", type_name(other)),
            ))
        }
    };

    // `position` is usually an anchor, but models also use it for the
    // above/below placement of a marker.
    let mut marker_position = optional_string(obj, "marker_position", &join(path, "marker_position"))?;
    let position = match obj.get("position") {
        Some(Value::String(s)) => {
            marker_position.get_or_insert_with(|| s.clone());
            None
        }
        _ => optional_anchor(obj, "position", mode, path)?,
    };

    let mut instruction = DrawInstruction::new(kind, mode);
    instruction.from = optional_anchor(obj, "from", mode, path)?;
    instruction.to = optional_anchor(obj, "to", mode, path)?;
    instruction.points = points;
    instruction.position = position;
    instruction.price = optional_number(obj, &["price"], path)?;
    instruction.y_norm = optional_number(obj, &["y_norm"], path)?.map(scale_norm);
    instruction.channel_width = optional_number(obj, &["channel_width"], path)?;
    instruction.start_x_norm = optional_number(obj, &["start_x_norm"], path)?.map(scale_norm);
    instruction.end_x_norm = optional_number(obj, &["end_x_norm"], path)?.map(scale_norm);
    instruction.start_bar_index = optional_index(obj, &["start_bar_index"], path)?;
    instruction.end_bar_index = optional_index(obj, &["end_bar_index"], path)?;
    instruction.style = DrawStyle {
        color: optional_string(obj, "color", &join(path, "color"))?,
        width: optional_number(obj, &["width"], path)?,
        text: optional_string(obj, "text", &join(path, "text"))?,
        shape: optional_string(obj, "shape", &join(path, "shape"))?,
        marker_position,
    };
    Ok(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DrawKind;

    fn decision(json: &str) -> Decision {
        validate(json).unwrap()
    }

    fn schema_path(json: &str) -> String {
        match validate(json) {
            Err(DecisionError::Schema { path, .. }) => path,
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn empty_object_gets_defaults() {
        let d = decision("{}");
        assert!(!d.enter);
        assert!(d.direction.is_none());
        assert_eq!(d.position_size, 0.0);
        assert_eq!(d.confidence, 0.0);
        assert!(d.leverage.is_none());
        assert!(d.entry_price.is_none());
        assert!(d.reason.is_empty());
        assert!(d.indicator_views.is_empty());
        assert!(d.draw_instructions.is_empty());
    }

    #[test]
    fn enter_coercion() {
        assert!(decision(r#"{"enter": true}"#).enter);
        assert!(decision(r#"{"enter": "Yes"}"#).enter);
        assert!(decision(r#"{"enter": 1}"#).enter);
        assert!(!decision(r#"{"enter": "maybe"}"#).enter);
        assert!(!decision(r#"{"enter": [true]}"#).enter);
    }

    #[test]
    fn direction_variants() {
        for raw in ["多", "buy", "LONG"] {
            let d = decision(&format!(r#"{{"direction": "{}"}}"#, raw));
            assert_eq!(d.direction_str(), Some("long"), "{raw}");
        }
        for raw in ["", "neutral", "wait"] {
            let d = decision(&format!(r#"{{"direction": "{}"}}"#, raw));
            assert!(d.direction.is_none(), "{raw}");
        }
        let d = decision(r#"{"direction": "hedge"}"#);
        assert_eq!(d.direction, Some(Lenient::Unrecognized("hedge".to_string())));
    }

    #[test]
    fn direction_must_be_scalar() {
        assert_eq!(schema_path(r#"{"direction": {"side": "long"}}"#), "direction");
    }

    #[test]
    fn size_and_confidence_are_clamped() {
        let d = decision(r#"{"position_size": 1.7, "confidence": -0.2}"#);
        assert_eq!(d.position_size, 1.0);
        assert_eq!(d.confidence, 0.0);

        let d = decision(r#"{"position_size": "0.25", "confidence": "0.8"}"#);
        assert!((d.position_size - 0.25).abs() < 1e-9);
        assert!((d.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn leverage_normalization_precedes_default() {
        for raw in ["0", "-5", "\"\"", "\"none\"", "\"null\"", "null", "\"abc\""] {
            let d = decision(&format!(r#"{{"leverage": {}}}"#, raw));
            assert!(d.leverage.is_none(), "{raw}");
            assert!((d.effective_leverage() - 1.0).abs() < 1e-9);
        }
        assert_eq!(decision(r#"{"leverage": 5}"#).leverage, Some(5.0));
        assert_eq!(decision(r#"{"leverage": "10x"}"#).leverage, Some(10.0));
    }

    #[test]
    fn entry_price_forms() {
        assert_eq!(
            decision(r#"{"entry_price": "market"}"#).entry_price,
            Some(EntryPrice::Market)
        );
        assert_eq!(
            decision(r#"{"entry_price": "86,850"}"#).entry_price,
            Some(EntryPrice::Limit(86850.0))
        );
        assert_eq!(
            decision(r#"{"entry_price": 86850}"#).entry_price,
            Some(EntryPrice::Limit(86850.0))
        );
        assert!(decision(r#"{"entry_price": "soon"}"#).entry_price.is_none());
        assert!(decision(r#"{"entry_price": ""}"#).entry_price.is_none());
    }

    #[test]
    fn stop_and_target_accept_short_names() {
        let d = decision(r#"{"stop_loss": 100, "take_profit_price": "120.5"}"#);
        assert_eq!(d.stop_loss, Some(100.0));
        assert_eq!(d.take_profit, Some(120.5));
    }

    #[test]
    fn indicator_views_with_passthrough() {
        let d = decision(
            r#"{"indicator_views": {
                "rsi": {"bias": "Bullish", "note": "above 50"},
                "macd": {"bias": "diverging"},
                "trend_strength": {"level": "strong", "bias": "bearish", "note": "ADX 32"},
                "volume": "neutral"
            }}"#,
        );
        let v = &d.indicator_views;
        assert_eq!(v.rsi.as_ref().unwrap().bias, Lenient::Known(Trend::Bullish));
        assert_eq!(v.rsi.as_ref().unwrap().note, "above 50");
        assert_eq!(
            v.macd.as_ref().unwrap().bias,
            Lenient::Unrecognized("diverging".to_string())
        );
        let ts = v.trend_strength.as_ref().unwrap();
        assert_eq!(ts.level, Lenient::Known(StrengthLevel::AboveAverage));
        assert_eq!(ts.bias, Lenient::Known(Trend::Bearish));
        assert_eq!(v.other["volume"].bias, Lenient::Known(Trend::Neutral));
    }

    #[test]
    fn bare_trend_strength_is_the_level() {
        let d = decision(
            r#"{"enter": true, "direction": "long",
                "indicator_views": {"rsi": "bullish", "trend_strength": "strong"}}"#,
        );
        assert!(d.enter);
        assert_eq!(d.direction_str(), Some("long"));
        let ts = d.indicator_views.trend_strength.as_ref().unwrap();
        assert_eq!(ts.level, Lenient::Known(StrengthLevel::AboveAverage));
        assert_eq!(ts.bias, Lenient::Known(Trend::Neutral));

        let d = decision(r#"{"indicator_views": {"adx": "choppy"}}"#);
        assert_eq!(
            d.indicator_views.trend_strength.unwrap().level,
            Lenient::Unrecognized("choppy".to_string())
        );
    }

    #[test]
    fn indicator_views_must_be_object() {
        assert_eq!(schema_path(r#"{"indicator_views": [1]}"#), "indicator_views");
        assert_eq!(
            schema_path(r#"{"indicator_views": {"rsi": 42}}"#),
            "indicator_views.rsi"
        );
    }

    #[test]
    fn root_must_be_object() {
        assert_eq!(schema_path("[1, 2]"), "$");
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(validate("{enter: yes"), Err(DecisionError::Parse(_))));
    }

    #[test]
    fn draw_instruction_shape_checks() {
        assert_eq!(schema_path(r#"{"draw_instructions": {}}"#), "draw_instructions");
        assert_eq!(
            schema_path(r#"{"draw_instructions": [{"type": "circle"}]}"#),
            "draw_instructions[0].type"
        );
        assert_eq!(
            schema_path(r#"{"draw_instructions": [{"color": "red"}]}"#),
            "draw_instructions[0].type"
        );
        assert_eq!(
            schema_path(r#"{"draw_instructions": [{"type": "hline"}, {"type": "hline", "price": "high"}]}"#),
            "draw_instructions[1].price"
        );
        assert_eq!(
            schema_path(r#"{"draw_instructions": [{"type": "polyline", "points": 3}]}"#),
            "draw_instructions[0].points"
        );
    }

    #[test]
    fn incomplete_anchors_are_still_valid_instructions() {
        let d = decision(r#"{"draw_instructions": [{"type": "trend_line", "from": {"price": 10}}]}"#);
        let i = &d.draw_instructions[0];
        assert_eq!(i.kind, DrawKind::TrendLine);
        assert!(i.to.is_none());
        assert_eq!(i.from.unwrap().price, Some(10.0));
    }

    #[test]
    fn mode_is_inferred_from_geometry() {
        let d = decision(
            r#"{"draw_instructions": [
                {"type": "trend_line", "from": {"x": 0.1, "y": 0.2}, "to": {"x": 0.9, "y": 0.4}},
                {"type": "trend_line", "from": {"bar_index": 1, "price": 5}, "to": {"bar_index": 4, "price": 6}},
                {"type": "hline", "mode": "norm", "y_norm": 0.5}
            ]}"#,
        );
        assert_eq!(d.draw_instructions[0].mode, AddressingMode::Normalized);
        assert_eq!(d.draw_instructions[1].mode, AddressingMode::Value);
        assert_eq!(d.draw_instructions[2].mode, AddressingMode::Normalized);
    }

    #[test]
    fn thousand_scale_normalized_coordinates() {
        let d = decision(
            r#"{"draw_instructions": [{"type": "marker", "mode": "normalized", "position": [250, 900]}]}"#,
        );
        let p = d.draw_instructions[0].position.unwrap();
        assert!((p.x_norm.unwrap() - 0.25).abs() < 1e-9);
        assert!((p.y_norm.unwrap() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn overshoot_past_the_edge_clamps_instead_of_rescaling() {
        let d = decision(
            r#"{"draw_instructions": [
                {"type": "hline", "mode": "normalized", "y_norm": 1.02},
                {"type": "marker", "mode": "normalized", "position": {"x": 1.5, "y": -0.1}}
            ]}"#,
        );
        assert_eq!(d.draw_instructions[0].y_norm, Some(1.0));
        let p = d.draw_instructions[1].position.unwrap();
        assert_eq!(p.x_norm, Some(1.0));
        assert_eq!(p.y_norm, Some(0.0));
        assert!((scale_norm(2.5) - 0.0025).abs() < 1e-12);
    }

    #[test]
    fn value_pairs_and_timestamps() {
        let d = decision(
            r#"{"draw_instructions": [{
                "type": "trend_line",
                "from": [3, 101.5],
                "to": {"time": "2024-01-15T12:05:00Z", "price": 104}
            }]}"#,
        );
        let i = &d.draw_instructions[0];
        assert_eq!(i.from.unwrap(), AnchorPoint::at_bar(3, 101.5));
        let to = i.to.unwrap();
        assert_eq!(to.timestamp.unwrap().to_rfc3339(), "2024-01-15T12:05:00+00:00");
        assert_eq!(to.price, Some(104.0));
    }

    #[test]
    fn unix_seconds_and_millis() {
        let d = decision(
            r#"{"draw_instructions": [{"type": "trend_line",
                "from": {"ts": 1705320000, "price": 1},
                "to": {"ts": 1705320300000, "price": 2}}]}"#,
        );
        let i = &d.draw_instructions[0];
        assert_eq!(i.from.unwrap().timestamp.unwrap().timestamp(), 1_705_320_000);
        assert_eq!(i.to.unwrap().timestamp.unwrap().timestamp(), 1_705_320_300);
    }

    #[test]
    fn negative_bar_index_is_rejected() {
        assert_eq!(
            schema_path(r#"{"draw_instructions": [{"type": "vertical_span", "start_bar_index": -1}]}"#),
            "draw_instructions[0].start_bar_index"
        );
    }

    #[test]
    fn string_position_becomes_marker_placement() {
        let d = decision(
            r#"{"draw_instructions": [{"type": "marker", "position": "below", "shape": "arrow_up"}]}"#,
        );
        let i = &d.draw_instructions[0];
        assert!(i.position.is_none());
        assert_eq!(i.style.marker_position.as_deref(), Some("below"));
        assert_eq!(i.style.shape.as_deref(), Some("arrow_up"));
    }
}
