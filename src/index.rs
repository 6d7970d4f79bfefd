// src/index.rs
//! # Indexer
//! Freezes a single total order over all tokens of a corpus and assigns each
//! token a [`Partition`].
//!
//! Order: documents by `(timestamp, id)`, then in-document reading order.
//! Positions are assigned exactly once in [`FrozenCorpus::freeze`]; nothing
//! downstream can renumber them, so every stage buckets fixed windows the
//! same way.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU64;
use std::ops::Range;
use std::sync::Arc;

use crate::corpus::Document;
use crate::tokenize::Tokenizer;

/// A word occurrence at its global position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub document_id: Arc<str>,
    /// Global, 0-based, strictly increasing in corpus order.
    pub position: u64,
    pub text: String,
}

/// Aggregation bucket. Scorer and Normalizer never look inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Partition {
    ByDate { date: NaiveDate },
    ByWindow { window: u64 },
    ByGroup { group: String },
    ByGroupAndDate { group: String, date: NaiveDate },
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::ByDate { date } => write!(f, "{date}"),
            Partition::ByWindow { window } => write!(f, "window:{window}"),
            Partition::ByGroup { group } => write!(f, "{group}"),
            Partition::ByGroupAndDate { group, date } => write!(f, "{group}/{date}"),
        }
    }
}

/// Bucketing policy, e.g. in TOML:
/// ```toml
/// [bucketing]
/// scheme = "fixed_window"
/// window_size = 80
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Bucketing {
    #[default]
    CalendarDate,
    FixedWindow { window_size: NonZeroU64 },
    Group,
    GroupAndDate,
}

#[derive(Debug, Clone)]
struct DocumentSlot {
    date: NaiveDate,
    group: String,
    tokens: Range<usize>,
}

/// Corpus with its token order fixed. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FrozenCorpus {
    docs: Vec<DocumentSlot>,
    tokens: Vec<Token>,
}

impl FrozenCorpus {
    /// Tokenize every document (in parallel) and number the tokens.
    pub fn freeze(documents: &[Document], tokenizer: &Tokenizer) -> Self {
        let mut ordered: Vec<&Document> = documents.iter().collect();
        // Ids are free-form and may repeat; text and group complete the order.
        ordered.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.id.cmp(&b.id))
                .then_with(|| a.text.cmp(&b.text))
                .then_with(|| a.group.cmp(&b.group))
        });

        let per_doc: Vec<Vec<String>> = ordered
            .par_iter()
            .map(|d| tokenizer.tokens(&d.text).collect::<Vec<String>>())
            .collect();

        let total: usize = per_doc.iter().map(Vec::len).sum();
        let mut tokens = Vec::with_capacity(total);
        let mut docs = Vec::with_capacity(ordered.len());

        for (doc, words) in ordered.into_iter().zip(per_doc) {
            let doc_id: Arc<str> = Arc::from(doc.id.as_str());
            let start = tokens.len();
            for text in words {
                let position = tokens.len() as u64;
                tokens.push(Token {
                    document_id: Arc::clone(&doc_id),
                    position,
                    text,
                });
            }
            docs.push(DocumentSlot {
                date: doc.date(),
                group: doc.group.clone(),
                tokens: start..tokens.len(),
            });
        }

        tracing::debug!(
            target: "index",
            documents = docs.len(),
            tokens = tokens.len(),
            "corpus frozen"
        );

        Self { docs, tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn document_count(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.docs.is_empty()
    }

    /// Assign each token its partition under `bucketing`.
    ///
    /// Date/group schemes register every document's partition even if the
    /// document produced no tokens, so empty partitions reach the Normalizer
    /// as zero denominators instead of vanishing.
    pub fn index(&self, bucketing: Bucketing) -> IndexedCorpus<'_> {
        let mut partitions = BTreeSet::new();
        let mut out = Vec::with_capacity(self.tokens.len());

        for slot in &self.docs {
            if !matches!(bucketing, Bucketing::FixedWindow { .. }) {
                partitions.insert(partition_of(bucketing, slot, slot.tokens.start as u64));
            }
            for token in &self.tokens[slot.tokens.clone()] {
                let partition = partition_of(bucketing, slot, token.position);
                partitions.insert(partition.clone());
                out.push(IndexedToken { partition, token });
            }
        }

        IndexedCorpus {
            tokens: out,
            partitions,
        }
    }
}

fn partition_of(bucketing: Bucketing, slot: &DocumentSlot, position: u64) -> Partition {
    match bucketing {
        Bucketing::CalendarDate => Partition::ByDate { date: slot.date },
        Bucketing::FixedWindow { window_size } => Partition::ByWindow {
            window: position / window_size.get(),
        },
        Bucketing::Group => Partition::ByGroup {
            group: slot.group.clone(),
        },
        Bucketing::GroupAndDate => Partition::ByGroupAndDate {
            group: slot.group.clone(),
            date: slot.date,
        },
    }
}

#[derive(Debug, Clone)]
pub struct IndexedToken<'a> {
    pub partition: Partition,
    pub token: &'a Token,
}

/// Tokens with partitions, plus the full partition set (including empty ones).
#[derive(Debug, Clone)]
pub struct IndexedCorpus<'a> {
    tokens: Vec<IndexedToken<'a>>,
    partitions: BTreeSet<Partition>,
}

impl<'a> IndexedCorpus<'a> {
    pub fn tokens(&self) -> &[IndexedToken<'a>] {
        &self.tokens
    }

    pub fn partitions(&self) -> &BTreeSet<Partition> {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
