use std::sync::Arc;

use crate::alignment::interpolation::{interpolate, uniform_split, CaptionSlot, Timing};
use crate::alignment::merge::MergeRuleTable;
use crate::alignment::postprocess::enforce_invariants;
use crate::config::{AlignerConfig, EmptyTranscriptionPolicy, MatchStrategy};
use crate::error::AlignmentError;
use crate::pipeline::traits::{SequenceMatcher, SplitMerger, Tokenizer};
use crate::types::{
    AlignmentInput, AlignmentNotice, AlignmentOutput, AlignmentStats, CaptionSource, MatchKind,
    Token, TokenMatch, TranscribedWord,
};

/// Aligns script tokens to transcribed words. Holds no per-call state, so
/// one instance can serve concurrent callers.
pub struct CaptionAligner {
    config: Arc<AlignerConfig>,
    rules: Arc<MergeRuleTable>,
    tokenizer: Box<dyn Tokenizer>,
    split_merger: Box<dyn SplitMerger>,
    sequence_matcher: Box<dyn SequenceMatcher>,
}

pub(crate) struct CaptionAlignerParts {
    pub config: Arc<AlignerConfig>,
    pub rules: Arc<MergeRuleTable>,
    pub tokenizer: Box<dyn Tokenizer>,
    pub split_merger: Box<dyn SplitMerger>,
    pub sequence_matcher: Box<dyn SequenceMatcher>,
}

impl CaptionAligner {
    pub(crate) fn from_parts(parts: CaptionAlignerParts) -> Self {
        Self {
            config: parts.config,
            rules: parts.rules,
            tokenizer: parts.tokenizer,
            split_merger: parts.split_merger,
            sequence_matcher: parts.sequence_matcher,
        }
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.config.strategy
    }

    pub fn rules_version(&self) -> u32 {
        self.rules.version
    }

    pub fn align(&self, input: &AlignmentInput) -> Result<AlignmentOutput, AlignmentError> {
        let tokens = self.tokenizer.tokenize(&input.script);
        if tokens.is_empty() {
            return Ok(AlignmentOutput::default());
        }
        if input.words.is_empty() {
            return self.align_without_transcription(&tokens, input.total_duration_ms);
        }

        let words: Vec<TranscribedWord> = input.words.iter().map(sanitize_word).collect();
        let merged = self.split_merger.merge(&words);
        let corrected = &merged.words;

        let matches = self.sequence_matcher.match_tokens(&tokens, corrected);
        if matches.len() != tokens.len() {
            return Err(AlignmentError::invalid_config(format!(
                "sequence matcher returned {} matches for {} tokens",
                matches.len(),
                tokens.len()
            )));
        }
        if let Some(token_idx) = matches
            .iter()
            .position(|m| !m.indices.is_empty() && m.kind.is_none())
        {
            return Err(AlignmentError::invalid_config(format!(
                "sequence matcher returned indices without a match kind for token {token_idx}"
            )));
        }

        let mut stats = AlignmentStats {
            token_count: tokens.len(),
            transcribed_count: words.len(),
            corrected_count: corrected.len(),
            merges: merged.merges,
            ..AlignmentStats::default()
        };

        let mut slots = Vec::with_capacity(tokens.len());
        let mut sources = Vec::with_capacity(tokens.len());
        for (token, token_match) in tokens.iter().zip(&matches) {
            let timing = slot_timing(token_match, corrected);
            let source = match timing.and(token_match.kind) {
                Some(kind) => {
                    count_kind(&mut stats, kind);
                    CaptionSource::Aligned { kind }
                }
                None => {
                    stats.interpolated += 1;
                    CaptionSource::Interpolated
                }
            };
            sources.push(source);
            slots.push(CaptionSlot {
                text: token.text.clone(),
                timing,
            });
        }

        let right_edge_ms = corrected
            .last()
            .map(|w| w.end_ms)
            .or(input.total_duration_ms)
            .unwrap_or(0);
        let captions = interpolate(&slots, right_edge_ms);

        let mut notices = Vec::new();
        for ambiguity in &merged.ambiguities {
            notices.push(AlignmentNotice::MergeAmbiguity {
                position: ambiguity.position,
                text: ambiguity.text.clone(),
                applied_rule: ambiguity.applied_rule,
                candidate_rules: ambiguity.candidate_rules.clone(),
            });
        }
        for (idx, (caption, source)) in captions.iter().zip(&sources).enumerate() {
            if matches!(source, CaptionSource::Interpolated) {
                notices.push(AlignmentNotice::UnmatchedToken {
                    token_index: idx,
                    text: caption.text.clone(),
                    start_ms: caption.start_ms,
                    end_ms: caption.end_ms,
                });
            }
        }

        let processed = enforce_invariants(captions);
        stats.clamped = processed.clamped;
        stats.dropped_empty = processed.dropped_empty;
        let sources: Vec<CaptionSource> = processed.kept.iter().map(|&i| sources[i]).collect();

        if stats.interpolated > 0 {
            tracing::warn!(
                interpolated = stats.interpolated,
                token_count = stats.token_count,
                "caption aligner: some tokens had no transcription match"
            );
        }
        tracing::info!(
            strategy = self.config.strategy.as_str(),
            token_count = stats.token_count,
            transcribed_count = stats.transcribed_count,
            corrected_count = stats.corrected_count,
            merges = stats.merges,
            exact = stats.exact,
            concatenated = stats.concatenated,
            contraction = stats.contraction,
            fuzzy = stats.fuzzy,
            interpolated = stats.interpolated,
            clamped = stats.clamped,
            "caption aligner: aligned"
        );

        Ok(AlignmentOutput {
            captions: processed.captions,
            sources,
            notices,
            stats,
        })
    }

    fn align_without_transcription(
        &self,
        tokens: &[Token],
        total_duration_ms: Option<u64>,
    ) -> Result<AlignmentOutput, AlignmentError> {
        match (self.config.empty_transcription, total_duration_ms) {
            (EmptyTranscriptionPolicy::Error, _) => Err(AlignmentError::EmptyTranscription {
                token_count: tokens.len(),
            }),
            (EmptyTranscriptionPolicy::UniformSplit, None) => Err(AlignmentError::invalid_input(
                "uniform split fallback needs total_duration_ms",
            )),
            (EmptyTranscriptionPolicy::UniformSplit, Some(total_ms)) => {
                tracing::warn!(
                    token_count = tokens.len(),
                    total_ms,
                    "caption aligner: empty transcription, splitting duration uniformly"
                );
                let processed = enforce_invariants(uniform_split(tokens, total_ms));
                let stats = AlignmentStats {
                    token_count: tokens.len(),
                    clamped: processed.clamped,
                    dropped_empty: processed.dropped_empty,
                    ..AlignmentStats::default()
                };
                Ok(AlignmentOutput {
                    sources: vec![CaptionSource::UniformFallback; processed.captions.len()],
                    captions: processed.captions,
                    notices: Vec::new(),
                    stats,
                })
            }
        }
    }
}

fn sanitize_word(word: &TranscribedWord) -> TranscribedWord {
    let mut word = word.clone();
    if word.end_ms < word.start_ms {
        tracing::debug!(
            text = word.text.as_str(),
            start_ms = word.start_ms,
            end_ms = word.end_ms,
            "caption aligner: clamping reversed word span"
        );
        word.end_ms = word.start_ms;
    }
    word
}

/// Span from the first consumed word's start to the last one's end,
/// with the first word's confidence.
fn slot_timing(token_match: &TokenMatch, words: &[TranscribedWord]) -> Option<Timing> {
    let first = words.get(*token_match.indices.first()?)?;
    let last = words.get(*token_match.indices.last()?)?;
    Some(Timing {
        start_ms: first.start_ms,
        end_ms: last.end_ms.max(first.start_ms),
        confidence: first.confidence,
    })
}

fn count_kind(stats: &mut AlignmentStats, kind: MatchKind) {
    match kind {
        MatchKind::Exact => stats.exact += 1,
        MatchKind::Concatenated { .. } => stats.concatenated += 1,
        MatchKind::Contraction { .. } => stats.contraction += 1,
        MatchKind::Fuzzy { .. } => stats.fuzzy += 1,
    }
}

#[cfg(test)]
mod tests;
