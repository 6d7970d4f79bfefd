// src/metrics.rs
//! Pipeline counters (Prometheus exposition via `metrics-exporter-prometheus`).

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series carry help text when rendered).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_documents_total", "Documents frozen into a corpus.");
        describe_counter!(
            "pipeline_tokens_total",
            "Tokens produced by the tokenizer (normalization denominators)."
        );
        describe_counter!(
            "pipeline_matched_tokens_total",
            "Tokens with at least one lexicon match."
        );
        describe_counter!(
            "pipeline_zero_denominator_total",
            "Scored rows whose partition had zero tokens."
        );
        describe_histogram!("pipeline_run_ms", "Pipeline run time in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if one is already installed.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Current snapshot in the Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
