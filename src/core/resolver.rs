use tracing::{debug, warn};

use crate::core::mapper::CoordinateMapper;
use crate::error::{OverlaySkipped, SkipReason};
use crate::models::{
    AddressingMode, AnchorPoint, DrawInstruction, DrawKind, OverlayBatch, ResolvedOverlay,
    ResolvedPoint, TextAnnotation,
};

/// Minimum number of placed points for a polyline to be drawn.
const MIN_POLYLINE_POINTS: usize = 2;

/// Turns draw instructions into concrete overlays against one mapper.
///
/// The mapper must come from the same bar window the model was shown.
/// Instructions that cannot be placed are logged and dropped.
pub struct OverlayResolver<'a> {
    mapper: &'a CoordinateMapper,
}

impl<'a> OverlayResolver<'a> {
    pub fn new(mapper: &'a CoordinateMapper) -> Self {
        Self { mapper }
    }

    pub fn resolve(&self, instructions: &[DrawInstruction]) -> OverlayBatch {
        let mut batch = OverlayBatch::default();

        for (index, instruction) in instructions.iter().enumerate() {
            match self.resolve_one(instruction) {
                Ok(overlay) => {
                    if let Some(annotation) = self.annotation_for(&overlay) {
                        batch.annotations.push(annotation);
                    }
                    batch.overlays.push(overlay);
                }
                Err(reason) => {
                    let skip = OverlaySkipped {
                        index,
                        kind: instruction.kind,
                        reason,
                    };
                    warn!("{}", skip);
                    batch.skipped += 1;
                }
            }
        }

        debug!(
            resolved = batch.overlays.len(),
            skipped = batch.skipped,
            annotations = batch.annotations.len(),
            "overlay resolution finished"
        );
        batch
    }

    pub fn resolve_one(&self, ins: &DrawInstruction) -> Result<ResolvedOverlay, SkipReason> {
        let style = ins.style.clone();
        let overlay = match ins.kind {
            DrawKind::HorizontalLine => ResolvedOverlay::HorizontalLine {
                price: self.level_price(ins).ok_or(SkipReason::MissingLevel)?,
                style,
            },
            DrawKind::TrendLine => {
                let (start, end) = self.segment(ins)?;
                ResolvedOverlay::TrendLine { start, end, style }
            }
            DrawKind::ParallelChannel => {
                let (start, end) = self.segment(ins)?;
                ResolvedOverlay::ParallelChannel {
                    start,
                    end,
                    channel_width: ins.channel_width,
                    style,
                }
            }
            DrawKind::RayLine => ResolvedOverlay::RayLine {
                start: self.required(ins.from.as_ref(), "from", ins.mode)?,
                through: ins.to.as_ref().and_then(|a| self.resolve_anchor(a, ins.mode)),
                style,
            },
            DrawKind::Polyline => ResolvedOverlay::Polyline {
                points: self.polyline_points(ins)?,
                style,
            },
            DrawKind::Marker => ResolvedOverlay::Marker {
                position: self.required(ins.position.as_ref().or(ins.from.as_ref()), "position", ins.mode)?,
                style,
            },
            DrawKind::Label => ResolvedOverlay::Label {
                position: self.required(ins.position.as_ref().or(ins.from.as_ref()), "position", ins.mode)?,
                style,
            },
            DrawKind::VerticalSpan => {
                let (start_bar_index, end_bar_index) = self.span(ins)?;
                ResolvedOverlay::VerticalSpan {
                    start_bar_index,
                    end_bar_index,
                    style,
                }
            }
        };
        Ok(overlay)
    }

    /// Place one anchor. Explicit bar index wins, then timestamp, then (in
    /// normalized mode) x. Price comes from `price`, or from y in normalized
    /// mode.
    pub fn resolve_anchor(&self, anchor: &AnchorPoint, mode: AddressingMode) -> Option<ResolvedPoint> {
        let normalized = mode == AddressingMode::Normalized;

        let bar_index = anchor
            .bar_index
            .or_else(|| anchor.timestamp.map(|t| self.mapper.time_to_bar_index(t)))
            .or_else(|| {
                anchor
                    .x_norm
                    .filter(|_| normalized)
                    .map(|x| self.mapper.x_norm_to_bar_index(x))
            })?;

        let price = anchor.price.or_else(|| {
            anchor.y_norm.filter(|_| normalized).map(|y| {
                let x = anchor.x_norm.unwrap_or(0.5);
                self.mapper.normalized_to_value(x, y).1
            })
        })?;

        Some(ResolvedPoint::new(bar_index, price))
    }

    fn required(
        &self,
        anchor: Option<&AnchorPoint>,
        name: &'static str,
        mode: AddressingMode,
    ) -> Result<ResolvedPoint, SkipReason> {
        anchor
            .and_then(|a| self.resolve_anchor(a, mode))
            .ok_or(SkipReason::UnresolvedAnchor(name))
    }

    fn segment(&self, ins: &DrawInstruction) -> Result<(ResolvedPoint, ResolvedPoint), SkipReason> {
        let start = self.required(ins.from.as_ref(), "from", ins.mode)?;
        let end = self.required(ins.to.as_ref(), "to", ins.mode)?;
        Ok((start, end))
    }

    fn level_price(&self, ins: &DrawInstruction) -> Option<f64> {
        ins.price.or_else(|| {
            ins.y_norm
                .filter(|_| ins.is_normalized())
                .map(|y| self.mapper.normalized_to_value(0.5, y).1)
        })
    }

    fn polyline_points(&self, ins: &DrawInstruction) -> Result<Vec<ResolvedPoint>, SkipReason> {
        let points: Vec<ResolvedPoint> = ins
            .points
            .iter()
            .filter_map(|p| self.resolve_anchor(p, ins.mode))
            .collect();

        if points.len() < MIN_POLYLINE_POINTS {
            return Err(SkipReason::TooFewPoints {
                resolved: points.len(),
                given: ins.points.len(),
            });
        }
        Ok(points)
    }

    /// One edge of a vertical span: explicit index, normalized x, or the
    /// bar of an anchor.
    fn span_edge(
        &self,
        index: Option<usize>,
        x_norm: Option<f64>,
        anchor: Option<&AnchorPoint>,
        mode: AddressingMode,
    ) -> Option<usize> {
        index
            .or_else(|| x_norm.map(|x| self.mapper.x_norm_to_bar_index(x)))
            .or_else(|| {
                let a = anchor?;
                a.bar_index
                    .or_else(|| a.timestamp.map(|t| self.mapper.time_to_bar_index(t)))
                    .or_else(|| {
                        a.x_norm
                            .filter(|_| mode == AddressingMode::Normalized)
                            .map(|x| self.mapper.x_norm_to_bar_index(x))
                    })
            })
    }

    fn span(&self, ins: &DrawInstruction) -> Result<(usize, usize), SkipReason> {
        let start = self.span_edge(ins.start_bar_index, ins.start_x_norm, ins.from.as_ref(), ins.mode);
        let end = self.span_edge(ins.end_bar_index, ins.end_x_norm, ins.to.as_ref(), ins.mode);
        match (start, end) {
            (Some(a), Some(b)) => Ok((a.min(b), a.max(b))),
            _ => Err(SkipReason::MissingSpan),
        }
    }

    fn annotation_for(&self, overlay: &ResolvedOverlay) -> Option<TextAnnotation> {
        let ResolvedOverlay::HorizontalLine { price, style } = overlay else {
            return None;
        };
        let text = style.label()?;
        Some(TextAnnotation {
            price: *price,
            text: text.to_string(),
            color: style.color.clone(),
            y_pixel: self.mapper.price_to_pixel_y(*price),
        })
    }
}

/// Resolve a list of instructions, keeping only the overlays.
pub fn resolve(instructions: &[DrawInstruction], mapper: &CoordinateMapper) -> Vec<ResolvedOverlay> {
    OverlayResolver::new(mapper).resolve(instructions).overlays
}
