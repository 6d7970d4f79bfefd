// src/config.rs
//! Pipeline configuration (TOML).
//!
//! Resolution order:
//! 1) `$SENTIMENT_CONFIG_PATH`
//! 2) `config/pipeline.toml`
//! 3) built-in defaults
//!
//! ```toml
//! [tokenizer]
//! extra_stopwords = ["rt", "amp", "https"]
//!
//! [bucketing]
//! scheme = "fixed_window"
//! window_size = 80
//!
//! [scoring]
//! labels = ["positive", "negative"]
//! zero_denominator = "undefined"
//! scale = "rate"
//!
//! [inputs]
//! corpus = "data/tweets.json"
//!
//! [[lexicons]]
//! name = "bing"
//! path = "data/bing.csv"
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::combine::Scale;
use crate::index::Bucketing;
use crate::lexicon::Label;
use crate::normalize::ZeroDenominator;
use crate::score::CountMode;
use crate::tokenize::TokenizerConfig;

pub const ENV_CONFIG_PATH: &str = "SENTIMENT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    #[serde(default)]
    pub bucketing: Bucketing,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub lexicons: Vec<LexiconSpec>,
}

fn default_positive() -> Label {
    Label::new("positive")
}
fn default_negative() -> Label {
    Label::new("negative")
}
fn default_labels() -> Vec<Label> {
    vec![default_positive(), default_negative()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Label subset the lexicon is restricted to; empty = every label.
    #[serde(default = "default_labels")]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub count_mode: CountMode,
    #[serde(default)]
    pub zero_denominator: ZeroDenominator,
    #[serde(default)]
    pub scale: Scale,
    #[serde(default = "default_positive")]
    pub positive: Label,
    #[serde(default = "default_negative")]
    pub negative: Label,
    /// Signed-scalar lexicons: net sentiment is this single label.
    #[serde(default)]
    pub score_label: Option<Label>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            count_mode: CountMode::default(),
            zero_denominator: ZeroDenominator::default(),
            scale: Scale::default(),
            positive: default_positive(),
            negative: default_negative(),
            score_label: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputsConfig {
    pub corpus: Option<PathBuf>,
}

/// One lexicon source on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconSpec {
    pub name: String,
    pub path: PathBuf,
    /// Score label for scalar lexicons, category for word lists.
    #[serde(default)]
    pub label: Option<String>,
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing pipeline config {}", path.display()))
    }

    /// Env var first, then `config/pipeline.toml`, then defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{} points to non-existent path", ENV_CONFIG_PATH));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        if s.score_label.is_none() && s.positive == s.negative {
            bail!("scoring.positive and scoring.negative must differ");
        }
        if !s.labels.is_empty() {
            for needed in [&s.positive, &s.negative] {
                if s.score_label.is_none() && !s.labels.contains(needed) {
                    bail!("scoring.labels is missing `{}`", needed);
                }
            }
            if let Some(l) = &s.score_label {
                if !s.labels.contains(l) {
                    bail!("scoring.labels is missing `{}`", l);
                }
            }
        }
        let mut names: Vec<&str> = self.lexicons.iter().map(|l| l.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            bail!("lexicon names must be unique");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_bing_style() {
        let cfg = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.bucketing, Bucketing::CalendarDate);
        assert_eq!(cfg.scoring.labels, default_labels());
        assert_eq!(cfg.scoring.zero_denominator, ZeroDenominator::Undefined);
        assert_eq!(cfg.scoring.scale, Scale::Rate);
        assert!(cfg.tokenizer.strip_urls);
    }

    #[test]
    fn full_file_parses() {
        let toml = r#"
[tokenizer]
strip_numbers = false
stopwords = "none"
extra_stopwords = ["rt", "amp"]

[bucketing]
scheme = "group_and_date"

[scoring]
labels = ["score"]
score_label = "score"
count_mode = "presence"
zero_denominator = "fail"
scale = "raw"

[inputs]
corpus = "data/tweets.json"

[[lexicons]]
name = "afinn"
path = "data/afinn.json"
"#;
        let cfg = PipelineConfig::from_toml_str(toml).unwrap();
        assert!(!cfg.tokenizer.strip_numbers);
        assert_eq!(cfg.bucketing, Bucketing::GroupAndDate);
        assert_eq!(cfg.scoring.count_mode, CountMode::Presence);
        assert_eq!(cfg.scoring.zero_denominator, ZeroDenominator::Fail);
        assert_eq!(cfg.scoring.score_label, Some(Label::new("score")));
        assert_eq!(cfg.lexicons[0].name, "afinn");
        assert_eq!(cfg.inputs.corpus, Some(PathBuf::from("data/tweets.json")));
    }

    #[test]
    fn inconsistent_labels_are_rejected() {
        let missing = "[scoring]\nlabels = [\"positive\"]\n";
        assert!(PipelineConfig::from_toml_str(missing).is_err());

        let dup = "[[lexicons]]\nname = \"a\"\npath = \"x\"\n[[lexicons]]\nname = \"a\"\npath = \"y\"\n";
        assert!(PipelineConfig::from_toml_str(dup).is_err());
    }
}
