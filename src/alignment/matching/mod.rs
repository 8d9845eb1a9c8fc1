use crate::alignment::distance::edit_distance;
use crate::alignment::normalize::{normalize, strip_apostrophes};
use crate::config::AlignerConfig;
use crate::types::{MatchKind, TranscribedWord};

pub mod global;
pub mod windowed;

pub use global::align_global;
pub use windowed::align_windowed;

/// Normalized transcription plus the comparison rules shared by both
/// matching strategies.
pub(crate) struct MatchContext<'a> {
    config: &'a AlignerConfig,
    normalized: Vec<String>,
}

impl<'a> MatchContext<'a> {
    pub(crate) fn new(config: &'a AlignerConfig, words: &[TranscribedWord]) -> Self {
        Self {
            config,
            normalized: words.iter().map(|w| normalize(&w.text)).collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.normalized.len()
    }

    /// Tests `original` against the `parts` transcribed words starting at
    /// `start`. Words that normalize to nothing never take part.
    pub(crate) fn match_run(&self, original: &str, start: usize, parts: usize) -> Option<MatchKind> {
        if original.is_empty() || parts == 0 || parts > self.config.max_concat {
            return None;
        }
        let run = self.normalized.get(start..start + parts)?;
        // Stray punctuation words are excluded from runs on purpose, so a
        // token never absorbs a neighbouring mark's timing.
        if run.iter().any(String::is_empty) {
            return None;
        }
        let candidate = run.concat();
        if candidate == original {
            return Some(if parts == 1 {
                MatchKind::Exact
            } else {
                MatchKind::Concatenated { parts }
            });
        }
        if self.contraction_equivalent(original, &candidate) {
            return Some(MatchKind::Contraction { parts });
        }
        None
    }

    /// Equality modulo apostrophes, restricted to the configured contractions.
    fn contraction_equivalent(&self, original: &str, candidate: &str) -> bool {
        let stripped_original = strip_apostrophes(original);
        let stripped_candidate = strip_apostrophes(candidate);
        if stripped_original != stripped_candidate {
            return false;
        }
        self.config
            .contractions
            .iter()
            .any(|c| c.full == stripped_original && c.joined_parts() == stripped_candidate)
    }

    /// Edit distance between `original` and word `index` when it is within
    /// the fuzzy threshold.
    pub(crate) fn fuzzy_distance(&self, original: &str, index: usize) -> Option<usize> {
        let candidate = self.normalized.get(index)?;
        if original.is_empty() || candidate.is_empty() {
            return None;
        }
        let distance = edit_distance(original, candidate);
        let threshold = self
            .config
            .fuzzy_threshold(original.chars().count(), candidate.chars().count());
        (distance <= threshold).then_some(distance)
    }
}
