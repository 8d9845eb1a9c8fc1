use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::alignment::normalize::normalize;
use crate::error::AlignmentError;

pub const DEFAULT_RULES_VERSION: u32 = 1;

/// Predicate over the normalized form of a transcribed word.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    AnyOf(Vec<String>),
    Regex(Regex),
}

impl Pattern {
    pub fn literal(text: &str) -> Self {
        Pattern::Literal(normalize(text))
    }

    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            Pattern::Literal(lit) => lit == normalized,
            Pattern::AnyOf(options) => options.iter().any(|o| o == normalized),
            Pattern::Regex(re) => re.is_match(normalized),
        }
    }

    fn compile(spec: &PatternSpec) -> Result<Self, AlignmentError> {
        Ok(match spec {
            PatternSpec::Literal(text) => Pattern::literal(text),
            PatternSpec::AnyOf(options) => {
                Pattern::AnyOf(options.iter().map(|o| normalize(o)).collect())
            }
            PatternSpec::Regex { regex } => Pattern::Regex(Regex::new(regex).map_err(|e| {
                AlignmentError::invalid_config(format!("merge rule regex '{regex}': {e}"))
            })?),
        })
    }
}

/// A known incorrect split and how to repair it.
#[derive(Debug, Clone)]
pub enum MergeRule {
    /// `current` followed by `next` collapses into one word.
    Forward {
        current: Pattern,
        next: Pattern,
        merged: Option<String>,
    },
    /// `current` folds into the previously emitted word matching `prev`.
    Backward {
        current: Pattern,
        prev: Pattern,
        merged: Option<String>,
    },
}

impl MergeRule {
    pub fn forward(current: &str, next: &str, merged: &str) -> Self {
        MergeRule::Forward {
            current: Pattern::literal(current),
            next: Pattern::literal(next),
            merged: Some(merged.to_string()),
        }
    }

    pub fn backward(current: &str, prev: &str, merged: &str) -> Self {
        MergeRule::Backward {
            current: Pattern::literal(current),
            prev: Pattern::literal(prev),
            merged: Some(merged.to_string()),
        }
    }

    pub fn merged_text(&self) -> Option<&str> {
        match self {
            MergeRule::Forward { merged, .. } | MergeRule::Backward { merged, .. } => {
                merged.as_deref()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Literal(String),
    AnyOf(Vec<String>),
    Regex { regex: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
pub enum MergeRuleSpec {
    Forward {
        current: PatternSpec,
        next: PatternSpec,
        #[serde(default)]
        merged: Option<String>,
    },
    Backward {
        current: PatternSpec,
        prev: PatternSpec,
        #[serde(default)]
        merged: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRuleTableSpec {
    pub version: u32,
    pub rules: Vec<MergeRuleSpec>,
}

/// Ordered, versioned rule table. Earlier rules win.
#[derive(Debug, Clone)]
pub struct MergeRuleTable {
    pub version: u32,
    rules: Vec<MergeRule>,
}

impl MergeRuleTable {
    pub fn new(version: u32, rules: Vec<MergeRule>) -> Self {
        Self { version, rules }
    }

    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read merge rule table", e))?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, AlignmentError> {
        let spec: MergeRuleTableSpec = serde_json::from_str(data)
            .map_err(|e| AlignmentError::json("parse merge rule table", e))?;
        Self::from_spec(&spec)
    }

    pub fn from_spec(spec: &MergeRuleTableSpec) -> Result<Self, AlignmentError> {
        let rules = spec
            .rules
            .iter()
            .map(|rule| {
                Ok(match rule {
                    MergeRuleSpec::Forward {
                        current,
                        next,
                        merged,
                    } => MergeRule::Forward {
                        current: Pattern::compile(current)?,
                        next: Pattern::compile(next)?,
                        merged: merged.clone(),
                    },
                    MergeRuleSpec::Backward {
                        current,
                        prev,
                        merged,
                    } => MergeRule::Backward {
                        current: Pattern::compile(current)?,
                        prev: Pattern::compile(prev)?,
                        merged: merged.clone(),
                    },
                })
            })
            .collect::<Result<Vec<_>, AlignmentError>>()?;
        Ok(Self::new(spec.version, rules))
    }

    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Indices of forward rules matching `current` then `next`, in table order.
    pub fn forward_matches(&self, current: &str, next: &str) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| match rule {
                MergeRule::Forward {
                    current: c,
                    next: n,
                    ..
                } => c.matches(current) && n.matches(next),
                MergeRule::Backward { .. } => false,
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Indices of backward rules matching `prev` then `current`, in table order.
    pub fn backward_matches(&self, prev: &str, current: &str) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| match rule {
                MergeRule::Backward {
                    current: c,
                    prev: p,
                    ..
                } => p.matches(prev) && c.matches(current),
                MergeRule::Forward { .. } => false,
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn rule(&self, idx: usize) -> Option<&MergeRule> {
        self.rules.get(idx)
    }
}

impl Default for MergeRuleTable {
    fn default() -> Self {
        default_rule_table()
    }
}

/// Splits observed in narrated short-form scripts.
pub fn default_rule_table() -> MergeRuleTable {
    let mut rules = vec![
        MergeRule::forward("un", "conscious", "Unconscious"),
        MergeRule::forward("em", "otional", "Emotional"),
        MergeRule::forward("rad", "ar", "Radar"),
        MergeRule::forward("pre", "front", "prefrontal"),
        MergeRule::backward("al", "front", "frontal"),
        MergeRule::forward("ind", "if", "indif"),
        MergeRule::backward("ference", "if", "difference"),
        MergeRule::forward("ch", "ases", "chases"),
        MergeRule::forward("unatt", "ain", "unattain"),
        MergeRule::backward("able", "ain", "attainable"),
        MergeRule::forward("ign", "ores", "ignores"),
        MergeRule::forward("fir", "mer", "firmer"),
        MergeRule::forward("ex", "es", "ex's"),
        MergeRule::forward("s", "ign", "sign"),
        MergeRule::backward("als", "ign", "signals"),
    ];
    rules.extend(
        [
            "won", "doesn", "didn", "hasn", "hadn", "weren", "aren", "isn", "wasn", "couldn",
            "wouldn", "shouldn",
        ]
        .into_iter()
        .map(|stem| MergeRule::forward(stem, "'t", &format!("{stem}'t"))),
    );
    rules.extend([
        MergeRule::forward("grow", "ling", "growling"),
        MergeRule::forward("compartment", "al", "compartmental"),
        MergeRule::backward("ization", "al", "alization"),
        MergeRule::forward("neuro", "science", "neuroscience"),
    ]);
    MergeRuleTable::new(DEFAULT_RULES_VERSION, rules)
}
