use serde::{Deserialize, Serialize};

use crate::core::mapper::DEFAULT_PADDING_RATIO;
use crate::models::DEFAULT_LEVERAGE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    // Render target the chart image was produced at
    pub chart_width: u32,
    pub chart_height: u32,
    // Fraction of the price range added above and below the window
    pub padding_ratio: f64,

    // Applied when a decision carries no leverage
    pub default_leverage: f64,

    // Where the CLI writes raw completions that failed to parse
    pub dump_dir: String,
    pub log_level: String,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        PipelineConfig {
            chart_width: env("CHART_WIDTH", "1280").parse().unwrap_or(1280),
            chart_height: env("CHART_HEIGHT", "720").parse().unwrap_or(720),
            padding_ratio: env("CHART_PADDING_RATIO", "0.05")
                .parse()
                .unwrap_or(DEFAULT_PADDING_RATIO),
            default_leverage: env("DEFAULT_LEVERAGE", "1")
                .parse()
                .ok()
                .filter(|v: &f64| *v > 0.0)
                .unwrap_or(DEFAULT_LEVERAGE),
            dump_dir: env("DEBUG_DUMP_DIR", "logs"),
            log_level: env("LOG_LEVEL", "info"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chart_width: 1280,
            chart_height: 720,
            padding_ratio: DEFAULT_PADDING_RATIO,
            default_leverage: DEFAULT_LEVERAGE,
            dump_dir: "logs".to_string(),
            log_level: "info".to_string(),
        }
    }
}
