// src/pipeline.rs
//! Single forward pass: freeze → index → score + totals → normalize → combine.
//!
//! Every stage is pure given its inputs; the only shared state is the
//! read-only lexicon handle.

use anyhow::Result;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::combine::{self, ComparisonRow, NetSentimentRow};
use crate::config::{PipelineConfig, ScoringConfig};
use crate::corpus::Document;
use crate::index::{Bucketing, FrozenCorpus};
use crate::lexicon::{Label, Lexicon};
use crate::metrics::ensure_metrics_described;
use crate::normalize::{normalize, ScoredRow};
use crate::score::{Aggregate, Scorer, Totals, WordContribution};
use crate::tokenize::Tokenizer;

/// Everything one run produces, for charting layers or further wrangling.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub lexicon: String,
    pub aggregate: Aggregate,
    pub totals: Totals,
    pub scored: Vec<ScoredRow>,
    pub net: Vec<NetSentimentRow>,
    pub contributions: Vec<WordContribution>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    tokenizer: Tokenizer,
    bucketing: Bucketing,
    scoring: ScoringConfig,
}

impl Pipeline {
    pub fn new(tokenizer: Tokenizer, bucketing: Bucketing, scoring: ScoringConfig) -> Self {
        Self {
            tokenizer,
            bucketing,
            scoring,
        }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(
            Tokenizer::new(cfg.tokenizer.clone()),
            cfg.bucketing,
            cfg.scoring.clone(),
        )
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Fix the token order once; reuse the result for every lexicon.
    pub fn freeze(&self, documents: &[Document]) -> FrozenCorpus {
        ensure_metrics_described();
        let frozen = FrozenCorpus::freeze(documents, &self.tokenizer);
        counter!("pipeline_documents_total").increment(frozen.document_count() as u64);
        counter!("pipeline_tokens_total").increment(frozen.tokens().len() as u64);
        frozen
    }

    /// Tokenize, score and normalize `documents` against `lexicon`.
    pub fn run(&self, documents: &[Document], lexicon: Arc<Lexicon>) -> Result<PipelineOutput> {
        let frozen = self.freeze(documents);
        self.run_frozen(&frozen, lexicon)
    }

    /// Score an already frozen corpus. The partition of every token derives
    /// from the positions fixed at freeze time.
    pub fn run_frozen(&self, frozen: &FrozenCorpus, lexicon: Arc<Lexicon>) -> Result<PipelineOutput> {
        ensure_metrics_described();
        let started = Instant::now();
        let name = lexicon.name().to_string();

        let labels = self.labels_for(&lexicon);
        let restricted = if self.scoring.labels.is_empty() {
            lexicon
        } else {
            Arc::new(lexicon.restrict(&labels))
        };

        let indexed = frozen.index(self.bucketing);
        let scorer = Scorer::new(restricted, self.scoring.count_mode);
        let aggregate = scorer.score(&indexed);
        let totals = Totals::from_indexed(&indexed);
        let matched = scorer.matched_tokens(&indexed);
        counter!("pipeline_matched_tokens_total").increment(matched as u64);

        debug!(
            target: "pipeline",
            lexicon = %name,
            tokens = indexed.len(),
            matched,
            partitions = totals.len(),
            rows = aggregate.len(),
            "aggregated"
        );

        let scored = normalize(&aggregate, &totals, &labels, self.scoring.zero_denominator)?;
        let net = self.combine(&scored);
        let contributions = scorer.contributions(&indexed);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("pipeline_run_ms").record(elapsed_ms);
        info!(
            target: "pipeline",
            lexicon = %name,
            partitions = totals.len(),
            net_rows = net.len(),
            elapsed_ms,
            "pipeline run finished"
        );

        Ok(PipelineOutput {
            lexicon: name,
            aggregate,
            totals,
            scored,
            net,
            contributions,
        })
    }

    /// Same frozen corpus, several lexicons; net rows tagged by lexicon name.
    pub fn compare_lexicons(
        &self,
        documents: &[Document],
        lexicons: &[Arc<Lexicon>],
    ) -> Result<Vec<ComparisonRow>> {
        let frozen = self.freeze(documents);
        let mut out = Vec::new();
        for lex in lexicons {
            let run = self.run_frozen(&frozen, Arc::clone(lex))?;
            out.extend(combine::tag(&run.lexicon, run.net));
        }
        Ok(out)
    }

    fn combine(&self, scored: &[ScoredRow]) -> Vec<NetSentimentRow> {
        let s = &self.scoring;
        match &s.score_label {
            Some(label) => combine::single_label(scored, label, s.scale),
            None => combine::net_sentiment(scored, &s.positive, &s.negative, s.scale),
        }
    }

    /// Requested label subset, or every label of the lexicon when unset.
    fn labels_for(&self, lexicon: &Lexicon) -> Vec<Label> {
        if self.scoring.labels.is_empty() {
            lexicon.labels()
        } else {
            self.scoring.labels.clone()
        }
    }
}
