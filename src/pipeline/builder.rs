use std::path::PathBuf;
use std::sync::Arc;

use crate::alignment::merge::{default_rule_table, MergeRuleTable};
use crate::config::{AlignerConfig, MatchStrategy};
use crate::error::AlignmentError;
use crate::pipeline::defaults::{
    GlobalDpMatcher, RuleTableMerger, WhitespaceTokenizer, WindowedMatcher,
};
use crate::pipeline::runtime::{CaptionAligner, CaptionAlignerParts};
use crate::pipeline::traits::{SequenceMatcher, SplitMerger, Tokenizer};

pub struct CaptionAlignerBuilder {
    config: AlignerConfig,
    merge_rules: Option<MergeRuleTable>,
    merge_rules_path: Option<PathBuf>,
    tokenizer: Option<Box<dyn Tokenizer>>,
    split_merger: Option<Box<dyn SplitMerger>>,
    sequence_matcher: Option<Box<dyn SequenceMatcher>>,
}

impl CaptionAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            merge_rules: None,
            merge_rules_path: None,
            tokenizer: None,
            split_merger: None,
            sequence_matcher: None,
        }
    }

    pub fn with_match_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn with_merge_rules(mut self, table: MergeRuleTable) -> Self {
        self.merge_rules = Some(table);
        self
    }

    /// Rule table read from JSON at build time. Ignored when a table was
    /// passed with [`Self::with_merge_rules`].
    pub fn with_merge_rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.merge_rules_path = Some(path.into());
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_split_merger(mut self, split_merger: Box<dyn SplitMerger>) -> Self {
        self.split_merger = Some(split_merger);
        self
    }

    pub fn with_sequence_matcher(mut self, sequence_matcher: Box<dyn SequenceMatcher>) -> Self {
        self.sequence_matcher = Some(sequence_matcher);
        self
    }

    pub fn build(self) -> Result<CaptionAligner, AlignmentError> {
        self.config.validate()?;

        let rules = match (self.merge_rules, &self.merge_rules_path) {
            (Some(table), _) => table,
            (None, Some(path)) => MergeRuleTable::load(path)?,
            (None, None) => default_rule_table(),
        };
        let rules = Arc::new(rules);
        let config = Arc::new(self.config);

        tracing::debug!(
            strategy = config.strategy.as_str(),
            rules_version = rules.version,
            rule_count = rules.len(),
            "caption aligner: building"
        );

        let sequence_matcher = match self.sequence_matcher {
            Some(matcher) => matcher,
            None => match config.strategy {
                MatchStrategy::Windowed => {
                    Box::new(WindowedMatcher::new(config.clone())) as Box<dyn SequenceMatcher>
                }
                MatchStrategy::Global => Box::new(GlobalDpMatcher::new(config.clone())),
            },
        };

        Ok(CaptionAligner::from_parts(CaptionAlignerParts {
            config,
            rules: rules.clone(),
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(WhitespaceTokenizer)),
            split_merger: self
                .split_merger
                .unwrap_or_else(|| Box::new(RuleTableMerger::new(rules))),
            sequence_matcher,
        }))
    }
}

impl Default for CaptionAlignerBuilder {
    fn default() -> Self {
        Self::new(AlignerConfig::default())
    }
}
