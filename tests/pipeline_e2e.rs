// tests/pipeline_e2e.rs
use chrono::NaiveDate;
use lexicon_sentiment::corpus::parse_timestamp;
use lexicon_sentiment::tokenize::StopwordSource;
use lexicon_sentiment::{
    Bucketing, Document, Label, Lexicon, Measure, Partition, Pipeline, Scale, Tokenizer,
    TokenizerConfig,
};
use lexicon_sentiment::config::ScoringConfig;
use std::sync::Arc;

fn day(d: u32) -> Partition {
    Partition::ByDate {
        date: NaiveDate::from_ymd_opt(2020, 1, d).unwrap(),
    }
}

fn bing() -> Arc<Lexicon> {
    Arc::new(Lexicon::from_entries(
        "bing",
        [("good", "positive", 1.0), ("bad", "negative", 1.0)],
    ))
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("a", "good bad bad ok", parse_timestamp("2020-01-01 09:00:00").unwrap(), "nyt"),
        Document::new("b", "good good", parse_timestamp("2020-01-02 09:00:00").unwrap(), "nyt"),
    ]
}

fn pipeline(scale: Scale) -> Pipeline {
    let tok = Tokenizer::new(TokenizerConfig {
        stopwords: StopwordSource::None,
        ..Default::default()
    });
    let scoring = ScoringConfig {
        scale,
        ..Default::default()
    };
    Pipeline::new(tok, Bucketing::CalendarDate, scoring)
}

#[test]
fn two_days_aggregate_totals_and_net() {
    let out = pipeline(Scale::Raw).run(&corpus(), bing()).unwrap();
    let pos = Label::new("positive");
    let neg = Label::new("negative");

    assert_eq!(out.aggregate.len(), 3);
    assert_eq!(out.aggregate.get(&day(1), &pos), Some(1.0));
    assert_eq!(out.aggregate.get(&day(1), &neg), Some(2.0));
    assert_eq!(out.aggregate.get(&day(2), &pos), Some(2.0));
    assert_eq!(out.aggregate.get(&day(2), &neg), None);

    assert_eq!(out.totals.get(&day(1)), Some(4));
    assert_eq!(out.totals.get(&day(2)), Some(2));

    let net: Vec<_> = out.net.iter().map(|r| (r.partition.clone(), r.sentiment)).collect();
    assert_eq!(
        net,
        vec![(day(1), Measure::Defined(-1.0)), (day(2), Measure::Defined(2.0))]
    );
}

#[test]
fn rate_scale_divides_by_partition_tokens() {
    let out = pipeline(Scale::Rate).run(&corpus(), bing()).unwrap();
    assert_eq!(out.net[0].sentiment, Measure::Defined(0.25 - 0.5));
    assert_eq!(out.net[1].sentiment, Measure::Defined(1.0));

    // "ok" matched nothing but still counts in the denominator
    let d1_matched: f64 = out
        .scored
        .iter()
        .filter(|r| r.partition == day(1))
        .map(|r| r.rate.value().unwrap())
        .sum();
    assert_eq!(d1_matched, 0.75);

    // outer join: the missing negative row at day 2 is present with 0
    let d2_neg = out
        .scored
        .iter()
        .find(|r| r.partition == day(2) && r.label.as_str() == "negative")
        .unwrap();
    assert_eq!(d2_neg.raw_count, 0.0);
    assert_eq!(d2_neg.rate, Measure::Defined(0.0));
}

#[test]
fn contributions_rank_words_by_count() {
    let out = pipeline(Scale::Raw).run(&corpus(), bing()).unwrap();
    let top: Vec<_> = out
        .contributions
        .iter()
        .map(|c| (c.word.as_str(), c.count))
        .collect();
    assert_eq!(top, vec![("good", 3), ("bad", 2)]);
}

#[test]
fn compare_lexicons_tags_rows_with_lexicon_name() {
    let afinn = Arc::new(Lexicon::from_entries(
        "afinn",
        [("good", "positive", 1.0), ("bad", "negative", 1.0), ("ok", "positive", 1.0)],
    ));
    let rows = pipeline(Scale::Raw)
        .compare_lexicons(&corpus(), &[bing(), afinn])
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows[..2].iter().all(|r| r.lexicon == "bing"));
    assert!(rows[2..].iter().all(|r| r.lexicon == "afinn"));
    // "ok" tips day 1 from -1 to 0 under the second lexicon
    assert_eq!(rows[2].sentiment, Measure::Defined(0.0));
}

#[test]
fn net_rows_serialize_flat() {
    let out = pipeline(Scale::Raw).run(&corpus(), bing()).unwrap();
    let v = serde_json::to_value(&out.net[0]).unwrap();
    assert_eq!(v, serde_json::json!({"date": "2020-01-01", "sentiment": -1.0}));
}
