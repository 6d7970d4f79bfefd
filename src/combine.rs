// src/combine.rs
//! # Net-sentiment Combiner
//! Label arithmetic over scored rows: `value(positive) − value(negative)`
//! per partition, at raw-count or normalized-rate scale. The combiner does
//! not care whether the rows were normalized; the caller picks the scale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::index::Partition;
use crate::lexicon::Label;
use crate::normalize::{Measure, ScoredRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Raw,
    #[default]
    Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetSentimentRow {
    #[serde(flatten)]
    pub partition: Partition,
    pub sentiment: Measure,
}

/// Net sentiment row tagged with the lexicon that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub lexicon: String,
    #[serde(flatten)]
    pub partition: Partition,
    pub sentiment: Measure,
}

fn value_of(row: &ScoredRow, scale: Scale) -> Measure {
    match scale {
        Scale::Raw => Measure::Defined(row.raw_count),
        Scale::Rate => row.rate,
    }
}

/// `positive − negative` per partition. A label missing at a partition
/// counts as 0; an undefined rate makes the difference undefined.
pub fn net_sentiment(
    rows: &[ScoredRow],
    positive: &Label,
    negative: &Label,
    scale: Scale,
) -> Vec<NetSentimentRow> {
    signed_sum(rows, scale, |label| {
        if label == positive {
            Some(1.0)
        } else if label == negative {
            Some(-1.0)
        } else {
            None
        }
    })
}

/// Net sentiment for signed-scalar lexicons: the summed score label itself.
pub fn single_label(rows: &[ScoredRow], label: &Label, scale: Scale) -> Vec<NetSentimentRow> {
    signed_sum(rows, scale, |l| (l == label).then_some(1.0))
}

fn signed_sum<F>(rows: &[ScoredRow], scale: Scale, sign: F) -> Vec<NetSentimentRow>
where
    F: Fn(&Label) -> Option<f64>,
{
    let mut acc: BTreeMap<&Partition, Measure> = BTreeMap::new();
    for row in rows {
        let Some(sign) = sign(&row.label) else {
            continue;
        };
        let slot = acc.entry(&row.partition).or_insert(Measure::Defined(0.0));
        *slot = match (*slot, value_of(row, scale)) {
            (Measure::Defined(a), Measure::Defined(b)) => Measure::Defined(a + sign * b),
            _ => Measure::Undefined,
        };
    }
    acc.into_iter()
        .map(|(p, sentiment)| NetSentimentRow {
            partition: p.clone(),
            sentiment,
        })
        .collect()
}

/// Tag net rows with a lexicon name, for side-by-side comparison.
pub fn tag(lexicon: &str, rows: Vec<NetSentimentRow>) -> Vec<ComparisonRow> {
    rows.into_iter()
        .map(|r| ComparisonRow {
            lexicon: lexicon.to_string(),
            partition: r.partition,
            sentiment: r.sentiment,
        })
        .collect()
}
