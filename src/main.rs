use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use vision_decision::config::PipelineConfig;
use vision_decision::models::BarSeries;
use vision_decision::{PipelineError, VisionPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = PipelineConfig::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    // vision-decision <bars.json> <completion.txt>...
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "vision-decision".into());
    let args: Vec<String> = args.collect();
    if args.len() < 2 {
        bail!("usage: {} <bars.json> <completion.txt>...", program);
    }

    let bars_path = &args[0];
    let bars_json = tokio::fs::read_to_string(bars_path)
        .await
        .with_context(|| format!("reading bar window {}", bars_path))?;
    let bars: BarSeries = serde_json::from_str(&bars_json)
        .with_context(|| format!("parsing bar window {}", bars_path))?;

    let completion_paths: Vec<PathBuf> = args[1..].iter().map(PathBuf::from).collect();
    let mut texts = Vec::with_capacity(completion_paths.len());
    for path in &completion_paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading completion {}", path.display()))?;
        texts.push(text);
    }

    info!(
        bars = bars.len(),
        completions = texts.len(),
        width = cfg.chart_width,
        height = cfg.chart_height,
        "processing model output"
    );

    let pipeline = VisionPipeline::new(&cfg);
    let results = pipeline.process_batch(texts, Arc::new(bars)).await?;

    let mut failures = 0;
    for (path, result) in completion_paths.iter().zip(results) {
        match result {
            Ok(output) => {
                let leverage = output.decision.leverage_or(cfg.default_leverage);
                let mut value = serde_json::to_value(&output)?;
                value["effective_leverage"] = serde_json::json!(leverage);
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            Err(e) => {
                failures += 1;
                error!("{}: {}", path.display(), e);
                if let Err(dump_err) = dump_failure(&cfg.dump_dir, path, &e).await {
                    error!("could not persist failed completion: {:#}", dump_err);
                }
            }
        }
    }

    if failures > 0 {
        bail!("{} completion(s) failed", failures);
    }
    Ok(())
}

/// Keep the raw completion and what was extracted from it for postmortem.
async fn dump_failure(dir: &str, source: &Path, err: &PipelineError) -> Result<()> {
    let (Some(raw), Some(extracted)) = (err.raw_text(), err.extracted_json()) else {
        return Ok(());
    };

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir))?;

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "completion".to_string());
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
    let raw_path = Path::new(dir).join(format!("{}_{}.raw.txt", stem, stamp));
    let json_path = Path::new(dir).join(format!("{}_{}.extracted.json", stem, stamp));

    tokio::fs::write(&raw_path, raw).await?;
    tokio::fs::write(&json_path, extracted).await?;
    info!("saved failed completion to {}", raw_path.display());
    Ok(())
}
