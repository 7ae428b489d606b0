use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::core::extractor;
use crate::core::mapper::CoordinateMapper;
use crate::core::resolver::OverlayResolver;
use crate::core::validator;
use crate::error::PipelineError;
use crate::models::{BarSeries, Decision, ResolvedOverlay, TextAnnotation};

/// What one model completion turns into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub decision: Decision,
    pub overlays: Vec<ResolvedOverlay>,
    pub annotations: Vec<TextAnnotation>,
    pub skipped_overlays: usize,
}

/// Extract → validate → resolve, for completions about one rendered chart.
#[derive(Debug, Clone, Copy)]
pub struct VisionPipeline {
    width: u32,
    height: u32,
    padding_ratio: f64,
}

impl VisionPipeline {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            width: cfg.chart_width,
            height: cfg.chart_height,
            padding_ratio: cfg.padding_ratio,
        }
    }

    /// Mapper for the window the chart image was rendered from.
    pub fn mapper(&self, bars: &BarSeries) -> Result<CoordinateMapper, PipelineError> {
        CoordinateMapper::with_padding(bars, self.width, self.height, self.padding_ratio)
    }

    pub fn parse_decision(&self, raw_text: &str) -> Result<Decision, PipelineError> {
        let extracted = extractor::extract(raw_text);
        validator::validate(&extracted)
            .map_err(|e| PipelineError::from_decision(e, raw_text, extracted))
    }

    pub fn process(&self, raw_text: &str, bars: &BarSeries) -> Result<PipelineOutput, PipelineError> {
        let decision = self.parse_decision(raw_text)?;
        let mapper = self.mapper(bars)?;
        Ok(Self::finish(decision, &mapper))
    }

    /// Same as `process` with a mapper the caller already built.
    pub fn process_with_mapper(
        &self,
        raw_text: &str,
        mapper: &CoordinateMapper,
    ) -> Result<PipelineOutput, PipelineError> {
        let decision = self.parse_decision(raw_text)?;
        Ok(Self::finish(decision, mapper))
    }

    fn finish(decision: Decision, mapper: &CoordinateMapper) -> PipelineOutput {
        let batch = OverlayResolver::new(mapper).resolve(&decision.draw_instructions);
        info!(
            enter = decision.enter,
            direction = decision.direction_str().unwrap_or("none"),
            overlays = batch.overlays.len(),
            skipped = batch.skipped,
            "decision processed"
        );
        PipelineOutput {
            decision,
            overlays: batch.overlays,
            annotations: batch.annotations,
            skipped_overlays: batch.skipped,
        }
    }

    /// Process several completions about the same chart in parallel. Each
    /// run builds its own mapper; results keep the input order.
    pub async fn process_batch(
        &self,
        texts: Vec<String>,
        bars: Arc<BarSeries>,
    ) -> Result<Vec<Result<PipelineOutput, PipelineError>>> {
        let handles: Vec<_> = texts
            .into_iter()
            .map(|text| {
                let pipeline = *self;
                let bars = Arc::clone(&bars);
                tokio::task::spawn_blocking(move || pipeline.process(&text, &bars))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle
                .await
                .with_context(|| format!("pipeline task {} did not complete", i))?;
            debug!(task = i, ok = result.is_ok(), "batch task finished");
            results.push(result);
        }
        Ok(results)
    }
}
