use thiserror::Error;

use crate::models::DrawKind;

/// Failure to turn a JSON string into a `Decision`.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid decision at `{path}`: {message}")]
    Schema { path: String, message: String },
}

impl DecisionError {
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        DecisionError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by a full pipeline run. Both text variants carry the raw
/// completion and the extracted JSON so callers can persist them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("model output contains no parseable JSON: {source}")]
    MalformedModelOutput {
        raw_text: String,
        extracted: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid decision schema at `{path}`: {message}")]
    InvalidDecisionSchema {
        path: String,
        message: String,
        raw_text: String,
        extracted: String,
    },

    #[error("cannot build a chart domain from an empty bar window")]
    EmptyChartDomain,
}

impl PipelineError {
    pub(crate) fn from_decision(err: DecisionError, raw_text: &str, extracted: String) -> Self {
        match err {
            DecisionError::Parse(source) => PipelineError::MalformedModelOutput {
                raw_text: raw_text.to_string(),
                extracted,
                source,
            },
            DecisionError::Schema { path, message } => PipelineError::InvalidDecisionSchema {
                path,
                message,
                raw_text: raw_text.to_string(),
                extracted,
            },
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        match self {
            PipelineError::MalformedModelOutput { raw_text, .. }
            | PipelineError::InvalidDecisionSchema { raw_text, .. } => Some(raw_text),
            PipelineError::EmptyChartDomain => None,
        }
    }

    pub fn extracted_json(&self) -> Option<&str> {
        match self {
            PipelineError::MalformedModelOutput { extracted, .. }
            | PipelineError::InvalidDecisionSchema { extracted, .. } => Some(extracted),
            PipelineError::EmptyChartDomain => None,
        }
    }
}

/// Why an instruction could not be placed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("no price or y_norm for the level")]
    MissingLevel,
    #[error("anchor `{0}` is missing or incomplete")]
    UnresolvedAnchor(&'static str),
    #[error("only {resolved} of {given} points could be placed")]
    TooFewPoints { resolved: usize, given: usize },
    #[error("span boundaries are missing")]
    MissingSpan,
}

/// A dropped overlay. Only ever logged, never returned as an error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("skipped draw instruction #{index} ({kind}): {reason}")]
pub struct OverlaySkipped {
    pub index: usize,
    pub kind: DrawKind,
    pub reason: SkipReason,
}
