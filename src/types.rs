use serde::{Deserialize, Serialize};

/// One unit of the authoritative script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Original casing and attached punctuation; this is what ends up on screen.
    pub text: String,
    /// Comparison-only form, see [`crate::alignment::normalize::normalize`].
    pub normalized: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized = crate::alignment::normalize::normalize(&text);
        Self { text, normalized }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribedWord {
    pub text: String,
    pub start_ms: u64,
    /// Always `>= start_ms`.
    pub end_ms: u64,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl TranscribedWord {
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.into(),
            start_ms,
            end_ms: end_ms.max(start_ms),
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Caption record handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedCaption {
    /// Always taken from the script token, never from the transcription.
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    #[serde(default)]
    pub timestamp_ms: u64,
    pub confidence: Option<f32>,
}

impl AlignedCaption {
    pub fn new(text: impl Into<String>, start_ms: u64, end_ms: u64, confidence: Option<f32>) -> Self {
        let end_ms = end_ms.max(start_ms);
        Self {
            text: text.into(),
            start_ms,
            end_ms,
            timestamp_ms: midpoint_ms(start_ms, end_ms),
            confidence,
        }
    }

    pub(crate) fn set_span(&mut self, start_ms: u64, end_ms: u64) {
        self.start_ms = start_ms;
        self.end_ms = end_ms.max(start_ms);
        self.timestamp_ms = midpoint_ms(self.start_ms, self.end_ms);
    }
}

/// `round((start + end) / 2)` with halves rounded up.
pub fn midpoint_ms(start_ms: u64, end_ms: u64) -> u64 {
    let sum = start_ms as u128 + end_ms as u128;
    ((sum + 1) / 2) as u64
}

#[derive(Debug, Clone, Default)]
pub struct AlignmentInput {
    pub script: String,
    pub words: Vec<TranscribedWord>,
    /// Used as the right edge for trailing unmatched tokens and by the
    /// uniform-split fallback.
    pub total_duration_ms: Option<u64>,
}

/// How a script token was resolved against the transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MatchKind {
    Exact,
    Concatenated { parts: usize },
    Contraction { parts: usize },
    Fuzzy { distance: usize },
}

/// Indices into the corrected transcription consumed by one script token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenMatch {
    pub indices: Vec<usize>,
    pub kind: Option<MatchKind>,
}

impl TokenMatch {
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn matched(indices: Vec<usize>, kind: MatchKind) -> Self {
        Self {
            indices,
            kind: Some(kind),
        }
    }

    pub fn is_matched(&self) -> bool {
        !self.indices.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum CaptionSource {
    Aligned { kind: MatchKind },
    Interpolated,
    UniformFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "notice")]
pub enum AlignmentNotice {
    /// Token timing was estimated by interpolation rather than alignment.
    UnmatchedToken {
        token_index: usize,
        text: String,
        start_ms: u64,
        end_ms: u64,
    },
    /// Several merge rules matched one position; `applied_rule` won.
    MergeAmbiguity {
        position: usize,
        text: String,
        applied_rule: usize,
        candidate_rules: Vec<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AlignmentStats {
    pub token_count: usize,
    pub transcribed_count: usize,
    pub corrected_count: usize,
    pub merges: usize,
    pub exact: usize,
    pub concatenated: usize,
    pub contraction: usize,
    pub fuzzy: usize,
    pub interpolated: usize,
    pub clamped: usize,
    pub dropped_empty: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentOutput {
    pub captions: Vec<AlignedCaption>,
    /// Parallel to `captions`.
    pub sources: Vec<CaptionSource>,
    pub notices: Vec<AlignmentNotice>,
    pub stats: AlignmentStats,
}

impl AlignmentOutput {
    pub fn interpolated_count(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s, CaptionSource::Interpolated))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_rounds_half_up() {
        assert_eq!(midpoint_ms(0, 150), 75);
        assert_eq!(midpoint_ms(0, 1), 1);
        assert_eq!(midpoint_ms(400, 650), 525);
    }

    #[test]
    fn transcribed_word_clamps_reversed_span() {
        let w = TranscribedWord::new("x", 500, 300);
        assert_eq!(w.start_ms, 500);
        assert_eq!(w.end_ms, 500);
    }

    #[test]
    fn caption_serializes_for_renderer() {
        let caption = AlignedCaption::new("mind.", 400, 650, None);
        let json = serde_json::to_value(&caption).unwrap();
        assert_eq!(json["startMs"], 400);
        assert_eq!(json["endMs"], 650);
        assert_eq!(json["timestampMs"], 525);
        assert!(json["confidence"].is_null());
    }

    #[test]
    fn token_carries_normalized_form() {
        let token = Token::new("Won't!");
        assert_eq!(token.text, "Won't!");
        assert_eq!(token.normalized, "won't");
    }
}
