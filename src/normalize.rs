// src/normalize.rs
//! # Normalizer
//! Outer-joins raw counts with per-partition token totals and turns counts
//! into rates (`raw_count / total_tokens`), so partitions of unequal size
//! become comparable.
//!
//! Every partition in `Totals` gets a row for every requested label
//! (`raw_count = 0` when nothing matched). A partition with zero tokens is
//! handled by the configured [`ZeroDenominator`] policy; it is never dropped
//! and never reported as a 0 rate.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::index::Partition;
use crate::lexicon::Label;
use crate::score::{Aggregate, Totals};

/// A numeric value that may be undefined (0/0). Serialized as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Measure {
    Defined(f64),
    Undefined,
}

impl Measure {
    pub fn value(self) -> Option<f64> {
        match self {
            Measure::Defined(v) => Some(v),
            Measure::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Measure::Defined(_))
    }
}

/// What to do with a partition whose denominator is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDenominator {
    /// Keep the row with `rate = Measure::Undefined`.
    #[default]
    Undefined,
    /// Abort normalization with an error naming the partition.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRow {
    #[serde(flatten)]
    pub partition: Partition,
    pub label: Label,
    pub raw_count: f64,
    pub total_tokens: u64,
    pub rate: Measure,
}

/// Outer join `aggregate` × `totals` on partition, for each of `labels`.
///
/// Rows come out ordered by partition, then in the order of `labels`.
/// An aggregate partition missing from `totals` means the two were not
/// computed from the same indexed corpus and is reported as an error.
pub fn normalize(
    aggregate: &Aggregate,
    totals: &Totals,
    labels: &[Label],
    policy: ZeroDenominator,
) -> Result<Vec<ScoredRow>> {
    if let Some(p) = aggregate.partitions().find(|p| !totals.contains(p)) {
        bail!("partition `{}` has counts but no token total", p);
    }

    let mut rows = Vec::with_capacity(totals.len() * labels.len());
    let mut undefined = 0usize;

    for (partition, total) in totals.iter() {
        for label in labels {
            let raw_count = aggregate.get(partition, label).unwrap_or(0.0);
            let rate = if total == 0 {
                match policy {
                    ZeroDenominator::Undefined => {
                        undefined += 1;
                        Measure::Undefined
                    }
                    ZeroDenominator::Fail => {
                        bail!("partition `{}` has zero tokens; rate is undefined", partition)
                    }
                }
            } else {
                Measure::Defined(raw_count / total as f64)
            };
            rows.push(ScoredRow {
                partition: partition.clone(),
                label: label.clone(),
                raw_count,
                total_tokens: total,
                rate,
            });
        }
    }

    if undefined > 0 {
        tracing::warn!(
            target: "normalize",
            rows = undefined,
            "zero-token partitions kept with undefined rate"
        );
        metrics::counter!("pipeline_zero_denominator_total").increment(undefined as u64);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> Partition {
        Partition::ByDate {
            date: NaiveDate::from_ymd_opt(2020, 1, d).unwrap(),
        }
    }

    fn labels() -> Vec<Label> {
        vec![Label::new("positive"), Label::new("negative")]
    }

    #[test]
    fn outer_join_fills_missing_labels_with_zero() {
        let agg: Aggregate = [((day(1), Label::new("positive")), 1.0)].into_iter().collect();
        let totals: Totals = [(day(1), 4), (day(2), 2)].into_iter().collect();

        let rows = normalize(&agg, &totals, &labels(), ZeroDenominator::Undefined).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].rate, Measure::Defined(0.25));
        assert_eq!(rows[1].label, Label::new("negative"));
        assert_eq!(rows[1].raw_count, 0.0);
        assert_eq!(rows[3].partition, day(2));
        assert_eq!(rows[3].rate, Measure::Defined(0.0));
    }

    #[test]
    fn zero_denominator_policy_is_explicit() {
        let agg = Aggregate::default();
        let totals: Totals = [(day(1), 0)].into_iter().collect();

        let rows = normalize(&agg, &totals, &labels(), ZeroDenominator::Undefined).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.rate == Measure::Undefined));

        let err = normalize(&agg, &totals, &labels(), ZeroDenominator::Fail).unwrap_err();
        assert!(err.to_string().contains("zero tokens"));
    }

    #[test]
    fn counts_without_totals_are_rejected() {
        let agg: Aggregate = [((day(3), Label::new("positive")), 1.0)].into_iter().collect();
        let totals: Totals = [(day(1), 4)].into_iter().collect();
        assert!(normalize(&agg, &totals, &labels(), ZeroDenominator::Undefined).is_err());
    }

    #[test]
    fn undefined_serializes_as_null() {
        let row = ScoredRow {
            partition: day(1),
            label: Label::new("positive"),
            raw_count: 0.0,
            total_tokens: 0,
            rate: Measure::Undefined,
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["date"], serde_json::json!("2020-01-01"));
        assert!(v["rate"].is_null());
    }
}
