pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod transcript;
pub mod types;

pub use alignment::merge::{default_rule_table, MergeRule, MergeRuleTable};
pub use config::{AlignerConfig, EmptyTranscriptionPolicy, MatchStrategy};
pub use error::AlignmentError;
pub use pipeline::builder::CaptionAlignerBuilder;
pub use pipeline::runtime::CaptionAligner;
pub use pipeline::traits::{SequenceMatcher, SplitMerger, Tokenizer};
pub use transcript::{flatten_entries, TranscriptEntry, WhisperOutput};
pub use types::{
    AlignedCaption, AlignmentInput, AlignmentNotice, AlignmentOutput, AlignmentStats,
    CaptionSource, MatchKind, TranscribedWord,
};

/// Aligns `script` against `words` with the default configuration and
/// rule table.
pub fn align_captions(
    script: &str,
    words: &[TranscribedWord],
) -> Result<Vec<AlignedCaption>, AlignmentError> {
    let aligner = CaptionAlignerBuilder::default().build()?;
    let output = aligner.align(&AlignmentInput {
        script: script.to_string(),
        words: words.to_vec(),
        total_duration_ms: None,
    })?;
    Ok(output.captions)
}
