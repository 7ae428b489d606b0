pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
#[cfg(test)]
pub mod test_helpers;

pub use error::{DecisionError, PipelineError};
pub use pipeline::{PipelineOutput, VisionPipeline};
