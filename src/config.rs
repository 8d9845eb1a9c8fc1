use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;

/// Deepest transcription run a single script token may absorb.
pub const MAX_CONCAT_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Greedy bounded forward search around a single cursor.
    #[default]
    Windowed,
    /// Full two-sequence dynamic programming over both token streams.
    Global,
}

impl MatchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStrategy::Windowed => "windowed",
            MatchStrategy::Global => "global",
        }
    }
}

/// What to do when the transcription has no words but the script does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTranscriptionPolicy {
    #[default]
    Error,
    /// Spread `total_duration_ms` evenly over every script token.
    UniformSplit,
}

/// A contraction whose apostrophe may be lost or split off by the
/// transcription, e.g. `wont` ≡ `won` + `t`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractionVariant {
    pub full: String,
    pub parts: Vec<String>,
}

impl ContractionVariant {
    pub fn new(full: &str, parts: &[&str]) -> Self {
        Self {
            full: full.to_string(),
            parts: parts.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub(crate) fn joined_parts(&self) -> String {
        self.parts.concat()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    /// How far behind the cursor the windowed search may start.
    pub lookbehind: usize,
    /// Exclusive window extent ahead of the cursor.
    pub lookahead: usize,
    /// Transcribed words one script token may consume (1..=3).
    pub max_concat: usize,
    pub fuzzy_ratio: f64,
    pub min_fuzzy_distance: usize,
    pub strategy: MatchStrategy,
    pub empty_transcription: EmptyTranscriptionPolicy,
    pub contractions: Vec<ContractionVariant>,
}

impl AlignerConfig {
    pub const DEFAULT_LOOKBEHIND: usize = 3;
    pub const DEFAULT_LOOKAHEAD: usize = 10;
    pub const DEFAULT_FUZZY_RATIO: f64 = 0.3;

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| AlignmentError::json("parse aligner config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.lookahead == 0 {
            return Err(AlignmentError::invalid_config("lookahead must be >= 1"));
        }
        if self.max_concat == 0 || self.max_concat > MAX_CONCAT_LIMIT {
            return Err(AlignmentError::invalid_config(format!(
                "max_concat must be within 1..={MAX_CONCAT_LIMIT}, got {}",
                self.max_concat
            )));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_ratio) {
            return Err(AlignmentError::invalid_config(format!(
                "fuzzy_ratio must be within [0, 1], got {}",
                self.fuzzy_ratio
            )));
        }
        if let Some(bad) = self.contractions.iter().find(|c| c.full.is_empty() || c.parts.len() < 2) {
            return Err(AlignmentError::invalid_config(format!(
                "contraction '{}' needs a non-empty full form and at least two parts",
                bad.full
            )));
        }
        Ok(())
    }

    /// Largest edit distance the fuzzy fallback accepts for the two forms.
    pub fn fuzzy_threshold(&self, a_len: usize, b_len: usize) -> usize {
        let scaled = (a_len.min(b_len) as f64 * self.fuzzy_ratio).floor() as usize;
        scaled.max(self.min_fuzzy_distance)
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            lookbehind: Self::DEFAULT_LOOKBEHIND,
            lookahead: Self::DEFAULT_LOOKAHEAD,
            max_concat: MAX_CONCAT_LIMIT,
            fuzzy_ratio: Self::DEFAULT_FUZZY_RATIO,
            min_fuzzy_distance: 1,
            strategy: MatchStrategy::default(),
            empty_transcription: EmptyTranscriptionPolicy::default(),
            contractions: default_contractions(),
        }
    }
}

pub fn default_contractions() -> Vec<ContractionVariant> {
    [
        "won", "don", "can", "shouldn", "wouldn", "couldn", "hasn", "haven", "isn", "aren", "wasn",
        "weren", "didn", "doesn",
    ]
    .into_iter()
    .map(|stem| ContractionVariant {
        full: format!("{stem}t"),
        parts: vec![stem.to_string(), "t".to_string()],
    })
    .collect()
}
