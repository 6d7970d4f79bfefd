// src/corpus.rs
//! Documents and the corpus sources that produce them.
//!
//! Acquisition (network, scraping) is out of scope; a source only turns an
//! already-available dump into immutable `Document`s.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One tweet (or any short text) with its partition-relevant attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Source / account name, e.g. "nytimes".
    pub group: String,
    /// Auxiliary engagement metrics (favorites, retweets, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            timestamp,
            group: group.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Calendar date (UTC) of the document.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Raw record shape of a tweet dump.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(alias = "timestamp", deserialize_with = "de_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(alias = "screen_name", alias = "group")]
    source: String,
    #[serde(default)]
    metrics: BTreeMap<String, f64>,
}

impl From<RawRecord> for Document {
    fn from(r: RawRecord) -> Self {
        // Null / missing text is an empty document, not an error.
        let text = r.text.unwrap_or_default();
        let id = r
            .id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| fingerprint(&text, &r.created_at));
        Document {
            id,
            text,
            timestamp: r.created_at,
            group: r.source,
            metrics: r.metrics,
        }
    }
}

/// RFC 3339 or `YYYY-MM-DD HH:MM:SS` (taken as UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(ndt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(anyhow!("unsupported timestamp `{}`", s))
}

fn de_timestamp<'de, D>(d: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Short, stable id: first 6 bytes of SHA-256 over text + timestamp, hex.
pub fn fingerprint(text: &str, ts: &DateTime<Utc>) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(ts.timestamp().to_le_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Parse a JSON array of tweet records.
pub fn parse_documents_json(s: &str) -> Result<Vec<Document>> {
    let raw: Vec<RawRecord> = serde_json::from_str(s)?;
    Ok(raw.into_iter().map(Document::from).collect())
}

#[async_trait::async_trait]
pub trait CorpusSource {
    async fn load(&self) -> Result<Vec<Document>>;
    fn name(&self) -> &str;
}

/// JSON dump on disk (array of records).
#[derive(Debug, Clone)]
pub struct JsonCorpusFile {
    path: PathBuf,
}

impl JsonCorpusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CorpusSource for JsonCorpusFile {
    async fn load(&self) -> Result<Vec<Document>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading corpus from {}", self.path.display()))?;
        let docs = parse_documents_json(&content)
            .with_context(|| format!("parsing corpus {}", self.path.display()))?;
        tracing::debug!(target: "corpus", path = %self.path.display(), documents = docs.len(), "corpus loaded");
        Ok(docs)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

/// Already-materialized documents (tests, embedding callers).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    docs: Vec<Document>,
}

impl InMemoryCorpus {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }
}

#[async_trait::async_trait]
impl CorpusSource for InMemoryCorpus {
    async fn load(&self) -> Result<Vec<Document>> {
        Ok(self.docs.clone())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
