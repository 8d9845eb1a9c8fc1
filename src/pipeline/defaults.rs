use std::sync::Arc;

use crate::alignment::matching::{align_global, align_windowed};
use crate::alignment::merge::{merge_split_words, MergeOutcome, MergeRuleTable};
use crate::alignment::tokenization::tokenize_script;
use crate::config::AlignerConfig;
use crate::pipeline::traits::{SequenceMatcher, SplitMerger, Tokenizer};
use crate::types::{Token, TokenMatch, TranscribedWord};

pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, script: &str) -> Vec<Token> {
        tokenize_script(script)
    }
}

pub struct RuleTableMerger {
    table: Arc<MergeRuleTable>,
}

impl RuleTableMerger {
    pub fn new(table: Arc<MergeRuleTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MergeRuleTable {
        &self.table
    }
}

impl SplitMerger for RuleTableMerger {
    fn merge(&self, words: &[TranscribedWord]) -> MergeOutcome {
        merge_split_words(words, &self.table)
    }
}

pub struct WindowedMatcher {
    config: Arc<AlignerConfig>,
}

impl WindowedMatcher {
    pub fn new(config: Arc<AlignerConfig>) -> Self {
        Self { config }
    }
}

impl SequenceMatcher for WindowedMatcher {
    fn match_tokens(&self, tokens: &[Token], words: &[TranscribedWord]) -> Vec<TokenMatch> {
        align_windowed(tokens, words, &self.config)
    }
}

pub struct GlobalDpMatcher {
    config: Arc<AlignerConfig>,
}

impl GlobalDpMatcher {
    pub fn new(config: Arc<AlignerConfig>) -> Self {
        Self { config }
    }
}

impl SequenceMatcher for GlobalDpMatcher {
    fn match_tokens(&self, tokens: &[Token], words: &[TranscribedWord]) -> Vec<TokenMatch> {
        align_global(tokens, words, &self.config)
    }
}
