use crate::alignment::merge::MergeOutcome;
use crate::types::{Token, TokenMatch, TranscribedWord};

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, script: &str) -> Vec<Token>;
}

pub trait SplitMerger: Send + Sync {
    fn merge(&self, words: &[TranscribedWord]) -> MergeOutcome;
}

/// Maps every token, in order, to the transcribed words it covers.
/// Implementations must return exactly one entry per token.
pub trait SequenceMatcher: Send + Sync {
    fn match_tokens(&self, tokens: &[Token], words: &[TranscribedWord]) -> Vec<TokenMatch>;
}
