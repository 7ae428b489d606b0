//! Vocabulary tables for the free-text fields the model fills in.
//!
//! Each table maps every spelling we accept to one canonical value. Lookups
//! are case-insensitive on trimmed input. A miss is not an error: callers
//! keep the original word in `Lenient::Unrecognized`.

use crate::models::{AddressingMode, Direction, DrawKind, Lenient, StrengthLevel, Trend};

pub struct SynonymTable<T: 'static> {
    entries: &'static [(&'static str, T)],
}

impl<T: Copy> SynonymTable<T> {
    pub const fn new(entries: &'static [(&'static str, T)]) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, raw: &str) -> Option<T> {
        let key = raw.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(word, _)| *word == key)
            .map(|(_, v)| *v)
    }

    /// Table hit, or the trimmed input kept verbatim.
    pub fn normalize(&self, raw: &str) -> Lenient<T> {
        match self.lookup(raw) {
            Some(v) => Lenient::Known(v),
            None => Lenient::Unrecognized(raw.trim().to_string()),
        }
    }
}

/// `None` means "no position": the model explicitly chose to stay flat.
pub static DIRECTIONS: SynonymTable<Option<Direction>> = SynonymTable::new(&[
    ("long", Some(Direction::Long)),
    ("buy", Some(Direction::Long)),
    ("bull", Some(Direction::Long)),
    ("bullish", Some(Direction::Long)),
    ("up", Some(Direction::Long)),
    ("多", Some(Direction::Long)),
    ("做多", Some(Direction::Long)),
    ("看多", Some(Direction::Long)),
    ("short", Some(Direction::Short)),
    ("sell", Some(Direction::Short)),
    ("bear", Some(Direction::Short)),
    ("bearish", Some(Direction::Short)),
    ("down", Some(Direction::Short)),
    ("空", Some(Direction::Short)),
    ("做空", Some(Direction::Short)),
    ("看空", Some(Direction::Short)),
    ("", None),
    ("neutral", None),
    ("none", None),
    ("null", None),
    ("wait", None),
    ("hold", None),
    ("flat", None),
    ("n/a", None),
    ("观望", None),
    ("中性", None),
]);

pub static BIASES: SynonymTable<Trend> = SynonymTable::new(&[
    ("bullish", Trend::Bullish),
    ("bull", Trend::Bullish),
    ("positive", Trend::Bullish),
    ("up", Trend::Bullish),
    ("long", Trend::Bullish),
    ("看多", Trend::Bullish),
    ("多", Trend::Bullish),
    ("bearish", Trend::Bearish),
    ("bear", Trend::Bearish),
    ("negative", Trend::Bearish),
    ("down", Trend::Bearish),
    ("short", Trend::Bearish),
    ("看空", Trend::Bearish),
    ("空", Trend::Bearish),
    ("neutral", Trend::Neutral),
    ("flat", Trend::Neutral),
    ("mixed", Trend::Neutral),
    ("none", Trend::Neutral),
    ("", Trend::Neutral),
    ("中性", Trend::Neutral),
]);

pub static STRENGTH_LEVELS: SynonymTable<StrengthLevel> = SynonymTable::new(&[
    ("below_average", StrengthLevel::BelowAverage),
    ("below average", StrengthLevel::BelowAverage),
    ("weak", StrengthLevel::BelowAverage),
    ("low", StrengthLevel::BelowAverage),
    ("弱", StrengthLevel::BelowAverage),
    ("average", StrengthLevel::Average),
    ("normal", StrengthLevel::Average),
    ("moderate", StrengthLevel::Average),
    ("medium", StrengthLevel::Average),
    ("中", StrengthLevel::Average),
    ("above_average", StrengthLevel::AboveAverage),
    ("above average", StrengthLevel::AboveAverage),
    ("strong", StrengthLevel::AboveAverage),
    ("high", StrengthLevel::AboveAverage),
    ("强", StrengthLevel::AboveAverage),
]);

pub static DRAW_KINDS: SynonymTable<DrawKind> = SynonymTable::new(&[
    ("horizontal_line", DrawKind::HorizontalLine),
    ("horizontal", DrawKind::HorizontalLine),
    ("hline", DrawKind::HorizontalLine),
    ("level", DrawKind::HorizontalLine),
    ("trend_line", DrawKind::TrendLine),
    ("trendline", DrawKind::TrendLine),
    ("line", DrawKind::TrendLine),
    ("parallel_channel", DrawKind::ParallelChannel),
    ("channel", DrawKind::ParallelChannel),
    ("ray_line", DrawKind::RayLine),
    ("ray", DrawKind::RayLine),
    ("polyline", DrawKind::Polyline),
    ("path", DrawKind::Polyline),
    ("marker", DrawKind::Marker),
    ("arrow", DrawKind::Marker),
    ("label", DrawKind::Label),
    ("text", DrawKind::Label),
    ("vertical_span", DrawKind::VerticalSpan),
    ("span", DrawKind::VerticalSpan),
    ("time_range", DrawKind::VerticalSpan),
]);

pub static ADDRESSING_MODES: SynonymTable<AddressingMode> = SynonymTable::new(&[
    ("value", AddressingMode::Value),
    ("price", AddressingMode::Value),
    ("absolute", AddressingMode::Value),
    ("business", AddressingMode::Value),
    ("normalized", AddressingMode::Normalized),
    ("normalised", AddressingMode::Normalized),
    ("norm", AddressingMode::Normalized),
    ("ratio", AddressingMode::Normalized),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_synonyms() {
        for word in ["多", "buy", "LONG", " Long "] {
            assert_eq!(DIRECTIONS.lookup(word), Some(Some(Direction::Long)), "{word}");
        }
        for word in ["空", "sell", "Short"] {
            assert_eq!(DIRECTIONS.lookup(word), Some(Some(Direction::Short)), "{word}");
        }
        for word in ["", "neutral", "wait", "NONE"] {
            assert_eq!(DIRECTIONS.lookup(word), Some(None), "{word}");
        }
        assert_eq!(DIRECTIONS.lookup("hedge"), None);
    }

    #[test]
    fn normalize_keeps_unknown_words() {
        assert_eq!(BIASES.normalize("Bullish"), Lenient::Known(Trend::Bullish));
        assert_eq!(
            BIASES.normalize(" diverging "),
            Lenient::Unrecognized("diverging".to_string())
        );
    }

    #[test]
    fn strength_levels_accept_spaces_and_underscores() {
        assert_eq!(
            STRENGTH_LEVELS.lookup("Above Average"),
            Some(StrengthLevel::AboveAverage)
        );
        assert_eq!(
            STRENGTH_LEVELS.lookup("below_average"),
            Some(StrengthLevel::BelowAverage)
        );
    }

    #[test]
    fn every_kind_is_reachable_by_its_wire_name() {
        for kind in DrawKind::ALL {
            assert_eq!(DRAW_KINDS.lookup(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn modes() {
        assert_eq!(ADDRESSING_MODES.lookup("Normalised"), Some(AddressingMode::Normalized));
        assert_eq!(ADDRESSING_MODES.lookup("price"), Some(AddressingMode::Value));
        assert_eq!(ADDRESSING_MODES.lookup("pixels"), None);
    }
}
