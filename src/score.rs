// src/score.rs
//! # Scorer
//! Joins indexed tokens against a lexicon and sums matched weights per
//! `(partition, label)`. Also computes the unfiltered per-partition token
//! totals used as normalization denominators.
//!
//! Aggregation is a map-reduce over token shards (rayon fold/reduce); partial
//! maps are merged by summation, so input order does not matter.
//!
//! Multi-label lexicons count a token once per matched label. A token that
//! hits `fear` and `negative` adds to both rows on purpose.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::index::{IndexedCorpus, Partition};
use crate::lexicon::{Label, Lexicon};

/// How a match increments its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    /// Add the entry weight (AFINN-style scores sum up).
    #[default]
    Weight,
    /// Add 1 per matched label regardless of weight.
    Presence,
}

/// Raw counts per `(partition, label)`. Absent pairs are implicitly zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    counts: BTreeMap<(Partition, Label), f64>,
}

impl Aggregate {
    pub fn add(&mut self, partition: &Partition, label: &Label, amount: f64) {
        let key = (partition.clone(), label.clone());
        *self.counts.entry(key).or_insert(0.0) += amount;
    }

    /// Sum two partial aggregates.
    pub fn merge(mut self, other: Aggregate) -> Aggregate {
        if self.counts.len() < other.counts.len() {
            return other.merge(self);
        }
        for (k, v) in other.counts {
            *self.counts.entry(k).or_insert(0.0) += v;
        }
        self
    }

    pub fn get(&self, partition: &Partition, label: &Label) -> Option<f64> {
        self.counts
            .get(&(partition.clone(), label.clone()))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Partition, &Label, f64)> {
        self.counts.iter().map(|((p, l), v)| (p, l, *v))
    }

    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        let mut last: Option<&Partition> = None;
        self.counts.keys().filter_map(move |(p, _)| {
            if last == Some(p) {
                None
            } else {
                last = Some(p);
                Some(p)
            }
        })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Total token count per partition over the UNFILTERED token stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    counts: BTreeMap<Partition, u64>,
}

impl Totals {
    /// Every registered partition starts at 0 (documents with no tokens
    /// keep their partition), then each token adds 1.
    pub fn from_indexed(indexed: &IndexedCorpus<'_>) -> Self {
        let mut counts: BTreeMap<Partition, u64> =
            indexed.partitions().iter().map(|p| (p.clone(), 0)).collect();
        for t in indexed.tokens() {
            *counts.entry(t.partition.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, partition: &Partition) -> Option<u64> {
        self.counts.get(partition).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Partition, u64)> {
        self.counts.iter().map(|(p, n)| (p, *n))
    }

    pub fn contains(&self, partition: &Partition) -> bool {
        self.counts.contains_key(partition)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn token_count(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl FromIterator<(Partition, u64)> for Totals {
    fn from_iter<T: IntoIterator<Item = (Partition, u64)>>(iter: T) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<((Partition, Label), f64)> for Aggregate {
    fn from_iter<T: IntoIterator<Item = ((Partition, Label), f64)>>(iter: T) -> Self {
        let mut agg = Aggregate::default();
        for ((p, l), v) in iter {
            agg.add(&p, &l, v);
        }
        agg
    }
}

/// How often a word contributed to a label (corpus-wide).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordContribution {
    pub word: String,
    pub label: Label,
    pub count: u64,
    /// Summed weight (equals `count` for presence lexicons).
    pub weight: f64,
}

/// Lexicon join + aggregation. Holds the lexicon as a shared read-only handle.
#[derive(Debug, Clone)]
pub struct Scorer {
    lexicon: Arc<Lexicon>,
    mode: CountMode,
}

impl Scorer {
    pub fn new(lexicon: Arc<Lexicon>, mode: CountMode) -> Self {
        Self { lexicon, mode }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn mode(&self) -> CountMode {
        self.mode
    }

    /// Sum matched weights per `(partition, label)`.
    pub fn score(&self, indexed: &IndexedCorpus<'_>) -> Aggregate {
        indexed
            .tokens()
            .par_iter()
            .fold(Aggregate::default, |mut acc, t| {
                for e in self.lexicon.lookup(&t.token.text) {
                    acc.add(&t.partition, &e.label, self.amount(e.weight));
                }
                acc
            })
            .reduce(Aggregate::default, Aggregate::merge)
    }

    /// Number of tokens that matched at least one entry.
    pub fn matched_tokens(&self, indexed: &IndexedCorpus<'_>) -> usize {
        indexed
            .tokens()
            .par_iter()
            .filter(|t| self.lexicon.contains(&t.token.text))
            .count()
    }

    /// Per `(word, label)` match counts, most frequent first (ties by word).
    pub fn contributions(&self, indexed: &IndexedCorpus<'_>) -> Vec<WordContribution> {
        let mut acc: HashMap<(&str, &Label), (u64, f64)> = HashMap::new();
        for t in indexed.tokens() {
            for e in self.lexicon.lookup(&t.token.text) {
                let slot = acc.entry((t.token.text.as_str(), &e.label)).or_insert((0, 0.0));
                slot.0 += 1;
                slot.1 += self.amount(e.weight);
            }
        }
        let mut out: Vec<WordContribution> = acc
            .into_iter()
            .map(|((word, label), (count, weight))| WordContribution {
                word: word.to_string(),
                label: label.clone(),
                count,
                weight,
            })
            .collect();
        out.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.word.cmp(&b.word))
                .then_with(|| a.label.cmp(&b.label))
        });
        out
    }

    #[inline]
    fn amount(&self, weight: f64) -> f64 {
        match self.mode {
            CountMode::Weight => weight,
            CountMode::Presence => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{parse_timestamp, Document};
    use crate::index::{Bucketing, FrozenCorpus};
    use crate::tokenize::{StopwordSource, Tokenizer, TokenizerConfig};
    use chrono::NaiveDate;

    fn tok() -> Tokenizer {
        Tokenizer::new(TokenizerConfig {
            stopwords: StopwordSource::None,
            ..Default::default()
        })
    }

    fn day(d: u32) -> Partition {
        Partition::ByDate {
            date: NaiveDate::from_ymd_opt(2020, 1, d).unwrap(),
        }
    }

    fn corpus() -> FrozenCorpus {
        let docs = vec![
            Document::new("1", "good bad bad ok", parse_timestamp("2020-01-01 10:00:00").unwrap(), "nyt"),
            Document::new("2", "good good", parse_timestamp("2020-01-02 10:00:00").unwrap(), "nyt"),
        ];
        FrozenCorpus::freeze(&docs, &tok())
    }

    #[test]
    fn counts_per_partition_and_label() {
        let lex = Lexicon::from_entries("bing", [("good", "positive", 1.0), ("bad", "negative", 1.0)]);
        let frozen = corpus();
        let idx = frozen.index(Bucketing::CalendarDate);
        let agg = Scorer::new(Arc::new(lex), CountMode::Weight).score(&idx);

        assert_eq!(agg.get(&day(1), &Label::new("positive")), Some(1.0));
        assert_eq!(agg.get(&day(1), &Label::new("negative")), Some(2.0));
        assert_eq!(agg.get(&day(2), &Label::new("positive")), Some(2.0));
        assert_eq!(agg.get(&day(2), &Label::new("negative")), None);
        assert_eq!(agg.len(), 3);
        assert_eq!(agg.partitions().count(), 2);

        let totals = Totals::from_indexed(&idx);
        assert_eq!(totals.get(&day(1)), Some(4));
        assert_eq!(totals.get(&day(2)), Some(2));
    }

    #[test]
    fn presence_mode_ignores_weights() {
        let lex = Lexicon::from_entries("afinn", [("good", "score", 3.0), ("bad", "score", -3.0)]);
        let frozen = corpus();
        let idx = frozen.index(Bucketing::CalendarDate);

        let weighted = Scorer::new(Arc::new(lex.clone()), CountMode::Weight).score(&idx);
        assert_eq!(weighted.get(&day(1), &Label::new("score")), Some(-3.0));

        let presence = Scorer::new(Arc::new(lex), CountMode::Presence).score(&idx);
        assert_eq!(presence.get(&day(1), &Label::new("score")), Some(3.0));
    }

    #[test]
    fn merge_sums_overlapping_rows() {
        let pos = Label::new("positive");
        let mut a = Aggregate::default();
        a.add(&day(1), &pos, 1.0);
        let mut b = Aggregate::default();
        b.add(&day(1), &pos, 2.0);
        b.add(&day(2), &pos, 5.0);
        let m = a.clone().merge(b.clone());
        assert_eq!(m, b.merge(a));
        assert_eq!(m.get(&day(1), &pos), Some(3.0));
        assert_eq!(m.get(&day(2), &pos), Some(5.0));
    }

    #[test]
    fn contributions_rank_words() {
        let lex = Lexicon::from_entries("bing", [("good", "positive", 1.0), ("bad", "negative", 1.0)]);
        let frozen = corpus();
        let idx = frozen.index(Bucketing::Group);
        let scorer = Scorer::new(Arc::new(lex), CountMode::Weight);
        let top = scorer.contributions(&idx);
        assert_eq!(top[0].word, "good");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].word, "bad");
        assert_eq!(top[1].count, 2);
        assert_eq!(scorer.matched_tokens(&idx), 5);
    }
}
