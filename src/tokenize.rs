// src/tokenize.rs
//! Tweet-aware word tokenizer.
//!
//! Works chunk by chunk (whitespace-delimited), so the token stream stays lazy:
//! 1) HTML entity decode (`&amp;` → `&`)
//! 2) URL chunks dropped when `strip_urls`
//! 3) split into pieces: `#tag` / `@handle`, words (inner apostrophes kept),
//!    single punctuation/symbol characters
//! 4) per-piece stripping according to the config, then lowercase
//! 5) final gates: at least one alphabetic char, not a stopword

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashSet;

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("url regex"));

static RE_PIECE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?u)[#@]?\w+(?:['’]\w+)*|\S").expect("piece regex")
});

static RE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)^\p{P}$").expect("punct regex"));

/// Which built-in stopword list to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopwordSource {
    #[default]
    English,
    None,
}

fn default_true() -> bool {
    true
}

/// Piece-level switches. Every token must still contain a letter, so lone
/// punctuation and symbol characters never survive, whatever the flags say.
/// In practice `strip_punct = false` keeps the `#`/`@` prefix of hashtags and
/// handles, and `strip_symbols` has no visible effect on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_true")]
    pub strip_punct: bool,
    #[serde(default = "default_true")]
    pub strip_urls: bool,
    #[serde(default = "default_true")]
    pub strip_numbers: bool,
    #[serde(default = "default_true")]
    pub strip_symbols: bool,
    #[serde(default)]
    pub stopwords: StopwordSource,
    /// Corpus-specific noise, e.g. `rt`, `amp`, `https`.
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_punct: true,
            strip_urls: true,
            strip_numbers: true,
            strip_symbols: true,
            stopwords: StopwordSource::English,
            extra_stopwords: Vec::new(),
        }
    }
}

/// Stateless tokenizer; cheap to share across threads.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    cfg: TokenizerConfig,
    stopwords: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(cfg: TokenizerConfig) -> Self {
        let mut stopwords: HashSet<String> = match cfg.stopwords {
            StopwordSource::English => ENGLISH_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            StopwordSource::None => HashSet::new(),
        };
        for w in &cfg.extra_stopwords {
            let w = w.trim();
            if !w.is_empty() {
                stopwords.insert(w.to_lowercase());
            }
        }
        Self { cfg, stopwords }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.cfg
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Lazy token stream in reading order. Call again to restart.
    pub fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split_whitespace()
            .flat_map(move |chunk| self.chunk_tokens(chunk))
    }

    /// Convenience: number of tokens `text` produces.
    pub fn count(&self, text: &str) -> usize {
        self.tokens(text).count()
    }

    fn chunk_tokens(&self, chunk: &str) -> Vec<String> {
        let decoded = html_escape::decode_html_entities(chunk);
        // URLs may be wrapped in brackets or glued to a word; cut them out and
        // keep tokenizing what is left around them.
        let text = if self.cfg.strip_urls {
            RE_URL.replace_all(&decoded, " ")
        } else {
            Cow::Borrowed(&*decoded)
        };

        RE_PIECE
            .find_iter(&text)
            .filter_map(|m| self.clean_piece(m.as_str()))
            .collect()
    }

    fn clean_piece(&self, piece: &str) -> Option<String> {
        let mut p = piece;

        if let Some(rest) = p.strip_prefix(['#', '@']) {
            if self.cfg.strip_punct && !rest.is_empty() {
                p = rest;
            }
        }

        let mut chars = p.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if !c.is_alphanumeric() && c != '_' {
                // Not a word char: either punctuation or a symbol ($, +, emoji, ...).
                let is_punct = RE_PUNCT.is_match(p);
                if (is_punct && self.cfg.strip_punct) || (!is_punct && self.cfg.strip_symbols) {
                    return None;
                }
            }
        }

        if self.cfg.strip_numbers && is_number(p) {
            return None;
        }

        let mut out = if self.cfg.lowercase {
            p.to_lowercase()
        } else {
            p.to_string()
        };
        if out.contains('’') {
            out = out.replace('’', "'");
        }

        if !out.chars().any(char::is_alphabetic) {
            return None;
        }
        if self.stopwords.contains(&out) {
            return None;
        }
        Some(out)
    }
}

/// Digits with optional `_`/`'` separators (e.g. `2020`, `1'000`).
fn is_number(p: &str) -> bool {
    p.chars().any(|c| c.is_numeric())
        && p.chars().all(|c| c.is_numeric() || c == '_' || c == '\'')
}

/// Snowball-style English list (lowercase).
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "would",
    "should", "could", "ought", "i'm", "you're", "he's", "she's", "it's", "we're", "they're",
    "i've", "you've", "we've", "they've", "i'd", "you'd", "he'd", "she'd", "we'd", "they'd",
    "i'll", "you'll", "he'll", "she'll", "we'll", "they'll", "isn't", "aren't", "wasn't",
    "weren't", "hasn't", "haven't", "hadn't", "doesn't", "don't", "didn't", "won't",
    "wouldn't", "shan't", "shouldn't", "can't", "cannot", "couldn't", "mustn't", "let's",
    "that's", "who's", "what's", "here's", "there's", "when's", "where's", "why's", "how's",
    "a", "an", "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at",
    "by", "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "will",
];
