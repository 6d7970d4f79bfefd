// src/lib.rs
//! Dictionary-based sentiment over a tweet corpus.
//!
//! Stages (each pure given its inputs):
//! `tokenize` → `index` (frozen order + partitions) → `score` (lexicon join,
//! aggregation, totals) → `normalize` (outer join, rates) → `combine`
//! (net sentiment). `pipeline` wires them together.

pub mod combine;
pub mod config;
pub mod corpus;
pub mod index;
pub mod lexicon;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod score;
pub mod tokenize;

// ---- Re-exports for stable public API ----
pub use crate::combine::{net_sentiment, ComparisonRow, NetSentimentRow, Scale};
pub use crate::config::PipelineConfig;
pub use crate::corpus::{CorpusSource, Document, InMemoryCorpus, JsonCorpusFile};
pub use crate::index::{Bucketing, FrozenCorpus, IndexedCorpus, Partition, Token};
pub use crate::lexicon::{Label, Lexicon, LexiconEntry};
pub use crate::normalize::{normalize, Measure, ScoredRow, ZeroDenominator};
pub use crate::pipeline::{Pipeline, PipelineOutput};
pub use crate::score::{Aggregate, CountMode, Scorer, Totals, WordContribution};
pub use crate::tokenize::{Tokenizer, TokenizerConfig};

use anyhow::{Context, Result};
use std::sync::Arc;

/// Load every `[[lexicons]]` entry of `cfg` as a shared read-only handle.
pub fn load_lexicons(cfg: &PipelineConfig) -> Result<Vec<Arc<Lexicon>>> {
    cfg.lexicons
        .iter()
        .map(|spec| {
            lexicon::load_from_path(&spec.path, &spec.name, spec.label.as_deref())
                .map(Arc::new)
                .with_context(|| format!("loading lexicon `{}`", spec.name))
        })
        .collect()
}
