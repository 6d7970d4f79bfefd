// src/lexicon.rs
//! # Lexicon
//!
//! Immutable `word → [(label, weight)]` mapping, loaded once and shared
//! read-only (`Arc<Lexicon>`) by every scorer.
//!
//! Supported shapes:
//! - binary categorical: `good → {(positive, 1)}`
//! - signed scalar:      `abandon → {(score, -2)}`
//! - multi-label:        `abandon → {(fear, 1), (sadness, 1), (negative, 1)}`
//! - custom word list:   every word → `{(label, 1)}`
//!
//! File adapters (JSON / CSV / TSV / plain word list) live at the bottom.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

/// Sentiment / category name, e.g. `positive`, `fear`, `score`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Label(String);

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(d).map(Label::new)
    }
}

impl Label {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::new(s)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::new(s)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexiconEntry {
    pub label: Label,
    pub weight: f64,
}

/// Label used for signed-scalar lexicons when the source does not name one.
pub const DEFAULT_SCORE_LABEL: &str = "score";

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    name: String,
    words: HashMap<String, Vec<LexiconEntry>>,
}

impl Lexicon {
    /// Build from `(word, label, weight)` triples. Duplicate `(word, label)`
    /// pairs keep the last weight.
    pub fn from_entries<I, W, L>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (W, L, f64)>,
        W: AsRef<str>,
        L: Into<Label>,
    {
        let mut words: HashMap<String, Vec<LexiconEntry>> = HashMap::new();
        for (w, l, weight) in entries {
            let word = normalize_word(w.as_ref());
            if word.is_empty() {
                continue;
            }
            let label = l.into();
            let slot = words.entry(word).or_default();
            match slot.iter_mut().find(|e| e.label == label) {
                Some(e) => e.weight = weight,
                None => slot.push(LexiconEntry { label, weight }),
            }
        }
        Self {
            name: name.into(),
            words,
        }
    }

    /// Degenerate lexicon from a custom word list: every word weighs 1.
    pub fn from_word_list<I, W>(name: impl Into<String>, label: impl Into<Label>, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        let label = label.into();
        Self::from_entries(
            name,
            words.into_iter().map(|w| (w, label.clone(), 1.0)),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// All `(label, weight)` pairs for `word`; empty on miss.
    pub fn lookup(&self, word: &str) -> &[LexiconEntry] {
        let hit = self.words.get(word).or_else(|| {
            // Tokens are usually already lowercase; only normalize on a miss.
            let n = normalize_word(word);
            if n == word {
                None
            } else {
                self.words.get(&n)
            }
        });
        hit.map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, word: &str) -> bool {
        !self.lookup(word).is_empty()
    }

    /// Distinct labels, sorted.
    pub fn labels(&self) -> Vec<Label> {
        let set: BTreeSet<&Label> = self
            .words
            .values()
            .flat_map(|v| v.iter().map(|e| &e.label))
            .collect();
        set.into_iter().cloned().collect()
    }

    /// Copy keeping only entries whose label is in `labels`.
    pub fn restrict(&self, labels: &[Label]) -> Self {
        let words = self
            .words
            .iter()
            .filter_map(|(w, entries)| {
                let kept: Vec<LexiconEntry> = entries
                    .iter()
                    .filter(|e| labels.contains(&e.label))
                    .cloned()
                    .collect();
                (!kept.is_empty()).then(|| (w.clone(), kept))
            })
            .collect();
        Self {
            name: self.name.clone(),
            words,
        }
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Case-normalization shared with the tokenizer's `lowercase` mode.
fn normalize_word(w: &str) -> String {
    w.trim().to_lowercase().replace('’', "'")
}

/* ----------------------------
Adapters (file formats)
---------------------------- */

/// Load a lexicon from disk. Format is picked by extension:
/// - `.json`         → [`parse_json`]
/// - `.csv` / `.tsv` → [`parse_delimited`]
/// - `.txt` / other  → [`parse_word_list`] (needs `label`)
///
/// `label` names the score label of scalar lexicons and the category of
/// word lists; defaults to `score` / the lexicon name.
pub fn load_from_path(path: &Path, name: &str, label: Option<&str>) -> Result<Lexicon> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading lexicon from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_by_hint(&content, ext.as_str(), name, label)
        .with_context(|| format!("parsing lexicon {}", path.display()))
}

fn parse_by_hint(s: &str, hint_ext: &str, name: &str, label: Option<&str>) -> Result<Lexicon> {
    match hint_ext {
        "json" => parse_json(s, name, label),
        "csv" => parse_delimited(s, ',', name),
        "tsv" => parse_delimited(s, '\t', name),
        _ => {
            // Try JSON first (cheap to reject), then fall back to a plain list.
            if let Ok(lex) = parse_json(s, name, label) {
                return Ok(lex);
            }
            parse_word_list(s, name, label.unwrap_or(name))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonValue {
    Scalar(f64),
    Category(String),
    Categories(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLexicon {
    Map(HashMap<String, JsonValue>),
    List(Vec<String>),
}

/// JSON object: values are numbers (scalar), strings (category) or string
/// arrays (multi-label). A bare JSON array of strings is a word list.
pub fn parse_json(s: &str, name: &str, label: Option<&str>) -> Result<Lexicon> {
    let parsed: JsonLexicon = serde_json::from_str(s)?;
    let lex = match parsed {
        JsonLexicon::List(words) => Lexicon::from_word_list(name, label.unwrap_or(name), words),
        JsonLexicon::Map(map) => {
            let score_label = label.unwrap_or(DEFAULT_SCORE_LABEL);
            let mut triples: Vec<(String, Label, f64)> = Vec::with_capacity(map.len());
            for (word, v) in map {
                match v {
                    JsonValue::Scalar(x) => triples.push((word, Label::new(score_label), x)),
                    JsonValue::Category(c) => triples.push((word, Label::new(c), 1.0)),
                    JsonValue::Categories(cs) => {
                        for c in cs {
                            triples.push((word.clone(), Label::new(c), 1.0));
                        }
                    }
                }
            }
            Lexicon::from_entries(name, triples)
        }
    };
    Ok(lex)
}

/// `word<sep>label[<sep>weight]` per line. A first line whose weight column
/// is not numeric, or that reads `word<sep>...`, is treated as a header.
/// Blank lines and `#` comments are skipped.
pub fn parse_delimited(s: &str, sep: char, name: &str) -> Result<Lexicon> {
    let mut triples = Vec::new();
    for (lineno, raw) in s.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let cols: Vec<&str> = line.split(sep).map(str::trim).collect();
        if lineno == 0 && is_header(&cols) {
            continue;
        }
        let (word, label, weight) = match cols.as_slice() {
            [w, l] => (*w, *l, 1.0),
            [w, l, x, ..] => {
                let weight = x
                    .parse::<f64>()
                    .map_err(|_| anyhow!("line {}: weight `{}` is not a number", lineno + 1, x))?;
                (*w, *l, weight)
            }
            _ => bail!("line {}: expected `word{}label[{}weight]`", lineno + 1, sep, sep),
        };
        triples.push((word.to_string(), Label::new(label), weight));
    }
    Ok(Lexicon::from_entries(name, triples))
}

fn is_header(cols: &[&str]) -> bool {
    if cols
        .first()
        .is_some_and(|c| c.eq_ignore_ascii_case("word") || c.eq_ignore_ascii_case("term"))
    {
        return true;
    }
    matches!(cols.get(2), Some(x) if x.parse::<f64>().is_err())
}

/// One word per line, uniform weight 1. Blank lines and `#` / `;` comments
/// (opinion-lexicon preambles) are skipped.
pub fn parse_word_list(s: &str, name: &str, label: &str) -> Result<Lexicon> {
    let words: Vec<&str> = s
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with(';'))
        .collect();
    if words.is_empty() {
        bail!("word list `{}` is empty", name);
    }
    Ok(Lexicon::from_word_list(name, label, words))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(s: &str) -> Label {
        Label::new(s)
    }

    #[test]
    fn lookup_is_case_normalized_and_empty_on_miss() {
        let lex = Lexicon::from_entries("t", [("Good", "positive", 1.0)]);
        assert_eq!(lex.lookup("good").len(), 1);
        assert_eq!(lex.lookup("GOOD")[0].label, l("positive"));
        assert!(lex.lookup("meh").is_empty());
    }

    #[test]
    fn multi_label_words_keep_every_label() {
        let lex = Lexicon::from_entries(
            "nrc",
            [
                ("abandon", "fear", 1.0),
                ("abandon", "sadness", 1.0),
                ("abandon", "negative", 1.0),
            ],
        );
        let labels: Vec<&str> = lex.lookup("abandon").iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["fear", "sadness", "negative"]);
        assert_eq!(lex.labels(), vec![l("fear"), l("negative"), l("sadness")]);
    }

    #[test]
    fn restrict_drops_other_labels_and_empty_words() {
        let lex = Lexicon::from_entries(
            "nrc",
            [
                ("abandon", "fear", 1.0),
                ("abandon", "negative", 1.0),
                ("joy", "joy", 1.0),
            ],
        );
        let r = lex.restrict(&[l("negative"), l("positive")]);
        assert_eq!(r.len(), 1);
        assert_eq!(r.lookup("abandon").len(), 1);
        assert!(r.lookup("joy").is_empty());
    }

    #[test]
    fn word_list_is_uniform_weight() {
        let lex = Lexicon::from_word_list("custom", "brexit", ["Brexit", "backstop", "  "]);
        assert_eq!(lex.len(), 2);
        let e = &lex.lookup("backstop")[0];
        assert_eq!(e.label, l("brexit"));
        assert_eq!(e.weight, 1.0);
    }

    #[test]
    fn json_shapes_parse() {
        let scalar = parse_json(r#"{"abandon": -2, "good": 3}"#, "afinn", None).unwrap();
        assert_eq!(scalar.lookup("abandon")[0].label, l("score"));
        assert_eq!(scalar.lookup("abandon")[0].weight, -2.0);

        let cat = parse_json(r#"{"good": "positive", "bad": "negative"}"#, "bing", None).unwrap();
        assert_eq!(cat.lookup("bad")[0].label, l("negative"));

        let multi = parse_json(r#"{"abandon": ["fear", "negative"]}"#, "nrc", None).unwrap();
        assert_eq!(multi.lookup("abandon").len(), 2);

        let list = parse_json(r#"["deal", "nodeal"]"#, "brexit", Some("topic")).unwrap();
        assert_eq!(list.lookup("deal")[0].label, l("topic"));
    }

    #[test]
    fn delimited_with_header_and_weights() {
        let csv = "word,sentiment,value\ngood,positive,1\nawful,score,-3\n\n# comment\n";
        let lex = parse_delimited(csv, ',', "mixed").unwrap();
        assert_eq!(lex.len(), 2);
        assert_eq!(lex.lookup("awful")[0].weight, -3.0);

        let tsv = "good\tpositive\nbad\tnegative\n";
        let lex = parse_delimited(tsv, '\t', "bing").unwrap();
        assert_eq!(lex.lookup("good")[0].weight, 1.0);
    }

    #[test]
    fn delimited_rejects_bad_rows() {
        assert!(parse_delimited("good\n", ',', "x").is_err());
        assert!(parse_delimited("good,positive,1\nbad,negative,lots\n", ',', "x").is_err());
    }
}
