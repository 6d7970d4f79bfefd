//! Batch entrypoint: score a tweet dump against the configured lexicons and
//! print net-sentiment rows as JSON lines on stdout.
//!
//! Config comes from `$SENTIMENT_CONFIG_PATH` or `config/pipeline.toml`.

use anyhow::{anyhow, Context, Result};
use lexicon_sentiment::{
    load_lexicons, metrics::Metrics, CorpusSource, JsonCorpusFile, Pipeline, PipelineConfig,
};
use std::io::Write;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; JSON when `SENTIMENT_LOG_JSON=1`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lexicon_sentiment=info,warn"));

    let json = std::env::var("SENTIMENT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    // Logs go to stderr; stdout carries the rows.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    let metrics = if std::env::var("SENTIMENT_METRICS").ok().as_deref() == Some("1") {
        Some(Metrics::init()?)
    } else {
        None
    };

    let cfg = PipelineConfig::load_default()?;
    let corpus_path = cfg
        .inputs
        .corpus
        .clone()
        .ok_or_else(|| anyhow!("inputs.corpus is not configured"))?;
    if cfg.lexicons.is_empty() {
        return Err(anyhow!("no [[lexicons]] configured"));
    }

    // Corpus and lexicons are independent one-shot loads.
    let source = JsonCorpusFile::new(corpus_path);
    let lex_cfg = cfg.clone();
    let (docs, lexicons) = tokio::try_join!(source.load(), async move {
        tokio::task::spawn_blocking(move || load_lexicons(&lex_cfg))
            .await
            .context("lexicon loader panicked")?
    })?;
    info!(
        documents = docs.len(),
        lexicons = lexicons.len(),
        source = source.name(),
        "inputs loaded"
    );

    let pipeline = Pipeline::from_config(&cfg);
    let rows = tokio::task::spawn_blocking(move || pipeline.compare_lexicons(&docs, &lexicons))
        .await
        .context("pipeline task panicked")??;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in &rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    let undefined = rows.iter().filter(|r| !r.sentiment.is_defined()).count();
    if undefined > 0 {
        warn!(rows = undefined, "some partitions had no tokens; sentiment is null");
    }

    if let Some(m) = metrics {
        eprintln!("{}", m.render());
    }

    Ok(())
}
