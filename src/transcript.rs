//! Conversion of transcription service output into [`TranscribedWord`]s.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AlignmentError;
use crate::types::TranscribedWord;

/// Word nested inside a segment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    pub text: String,
    #[serde(default, alias = "startMs")]
    pub start_ms: Option<u64>,
    #[serde(default, alias = "endMs")]
    pub end_ms: Option<u64>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

/// One transcription entry: a single timed word, a segment with a word
/// list, or a segment that only has its own timing and text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    #[serde(default, alias = "startMs")]
    pub start_ms: Option<u64>,
    #[serde(default, alias = "endMs")]
    pub end_ms: Option<u64>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub words: Vec<TranscriptWord>,
}

impl TranscriptEntry {
    pub fn timed(text: &str, start_ms: u64, end_ms: u64) -> Self {
        Self {
            text: text.to_string(),
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
            confidence: None,
            words: Vec::new(),
        }
    }
}

/// Flattens entries into the ordered word list the aligner consumes.
///
/// Nested word lists win over segment text. A segment without words is
/// split on whitespace and every word gets `duration / word_count`.
/// Anything missing a start or end is skipped.
pub fn flatten_entries(entries: &[TranscriptEntry]) -> Vec<TranscribedWord> {
    let mut words = Vec::new();
    for (entry_idx, entry) in entries.iter().enumerate() {
        if !entry.words.is_empty() {
            for word in &entry.words {
                match (word.start_ms, word.end_ms) {
                    (Some(start), Some(end)) => {
                        words.push(timed_word(&word.text, start, end, word.confidence));
                    }
                    _ => tracing::debug!(
                        entry_idx,
                        text = word.text.as_str(),
                        "transcript: skipping untimed word"
                    ),
                }
            }
            continue;
        }

        let (Some(start), Some(end)) = (entry.start_ms, entry.end_ms) else {
            tracing::debug!(
                entry_idx,
                text = entry.text.as_str(),
                "transcript: skipping untimed entry"
            );
            continue;
        };
        let parts: Vec<&str> = entry.text.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            [single] => words.push(timed_word(single, start, end, entry.confidence)),
            _ => words.extend(split_segment(&parts, start, end.max(start))),
        }
    }
    words
}

fn timed_word(text: &str, start_ms: u64, end_ms: u64, confidence: Option<f32>) -> TranscribedWord {
    TranscribedWord {
        text: text.trim().to_string(),
        start_ms,
        end_ms: end_ms.max(start_ms),
        confidence,
    }
}

fn split_segment(parts: &[&str], start_ms: u64, end_ms: u64) -> Vec<TranscribedWord> {
    let per_word = (end_ms - start_ms) as f64 / parts.len() as f64;
    parts
        .iter()
        .enumerate()
        .map(|(k, text)| {
            let word_start = start_ms as f64 + k as f64 * per_word;
            TranscribedWord::new(
                *text,
                word_start.round() as u64,
                (word_start + per_word).round() as u64,
            )
        })
        .collect()
}

pub fn load_entries(path: &Path) -> Result<Vec<TranscribedWord>, AlignmentError> {
    let data =
        std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read transcript", e))?;
    let entries: Vec<TranscriptEntry> =
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse transcript", e))?;
    Ok(flatten_entries(&entries))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhisperWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub probability: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhisperSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub words: Vec<WhisperWord>,
}

/// Whisper JSON output; times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhisperOutput {
    #[serde(default)]
    pub text: String,
    pub segments: Vec<WhisperSegment>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl WhisperOutput {
    pub fn from_json_str(data: &str) -> Result<Self, AlignmentError> {
        serde_json::from_str(data).map_err(|e| AlignmentError::json("parse whisper output", e))
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration.map(seconds_to_ms)
    }

    pub fn into_transcribed_words(self) -> Vec<TranscribedWord> {
        let entries: Vec<TranscriptEntry> = self
            .segments
            .into_iter()
            .map(|segment| TranscriptEntry {
                text: segment.text,
                start_ms: Some(seconds_to_ms(segment.start)),
                end_ms: Some(seconds_to_ms(segment.end)),
                confidence: None,
                words: segment
                    .words
                    .into_iter()
                    .map(|w| TranscriptWord {
                        text: w.word,
                        start_ms: Some(seconds_to_ms(w.start)),
                        end_ms: Some(seconds_to_ms(w.end)),
                        confidence: w.probability,
                    })
                    .collect(),
            })
            .collect();
        flatten_entries(&entries)
    }
}

fn seconds_to_ms(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(words: &[TranscribedWord]) -> Vec<(&str, u64, u64)> {
        words
            .iter()
            .map(|w| (w.text.as_str(), w.start_ms, w.end_ms))
            .collect()
    }

    #[test]
    fn word_level_entries_pass_through() {
        let words = flatten_entries(&[
            TranscriptEntry::timed("Un", 0, 200),
            TranscriptEntry::timed("conscious", 200, 400),
        ]);
        assert_eq!(spans(&words), vec![("Un", 0, 200), ("conscious", 200, 400)]);
    }

    #[test]
    fn segment_words_are_preferred_over_segment_text() {
        let mut segment = TranscriptEntry::timed("hello world", 0, 1000);
        segment.words = vec![
            TranscriptWord {
                text: " hello".to_string(),
                start_ms: Some(0),
                end_ms: Some(300),
                confidence: Some(0.7),
            },
            TranscriptWord {
                text: "world".to_string(),
                start_ms: None,
                end_ms: Some(900),
                confidence: None,
            },
        ];
        let words = flatten_entries(&[segment]);
        assert_eq!(spans(&words), vec![("hello", 0, 300)]);
        assert_eq!(words[0].confidence, Some(0.7));
    }

    #[test]
    fn segment_text_is_split_proportionally() {
        let words = flatten_entries(&[TranscriptEntry::timed("one two three", 1000, 2000)]);
        assert_eq!(
            spans(&words),
            vec![("one", 1000, 1333), ("two", 1333, 1667), ("three", 1667, 2000)]
        );
    }

    #[test]
    fn untimed_and_reversed_entries() {
        let untimed = TranscriptEntry {
            text: "lost".to_string(),
            start_ms: None,
            end_ms: None,
            confidence: None,
            words: Vec::new(),
        };
        let words = flatten_entries(&[untimed, TranscriptEntry::timed("late", 500, 300)]);
        assert_eq!(spans(&words), vec![("late", 500, 500)]);
    }

    #[test]
    fn entries_accept_camel_case_timing() {
        let json = r#"[{ "text": "hi", "startMs": 10, "endMs": 90, "confidence": 0.5 }]"#;
        let entries: Vec<TranscriptEntry> = serde_json::from_str(json).expect("valid json");
        assert_eq!(entries[0].start_ms, Some(10));
        assert_eq!(flatten_entries(&entries)[0].end_ms, 90);
    }

    #[test]
    fn whisper_output_converts_seconds() {
        let json = r#"{
            "text": " won't stop",
            "language": "en",
            "duration": 1.25,
            "segments": [
                { "text": " won't", "start": 0.0, "end": 0.15,
                  "words": [
                    { "word": " won", "start": 0.0, "end": 0.1, "probability": 0.9 },
                    { "word": "'t", "start": 0.1, "end": 0.15, "probability": 0.6 }
                  ] },
                { "text": " stop now", "start": 0.15, "end": 0.4 }
            ]
        }"#;
        let output = WhisperOutput::from_json_str(json).expect("valid whisper json");
        assert_eq!(output.duration_ms(), Some(1250));
        let words = output.into_transcribed_words();
        assert_eq!(
            spans(&words),
            vec![
                ("won", 0, 100),
                ("'t", 100, 150),
                ("stop", 150, 275),
                ("now", 275, 400)
            ]
        );
        assert_eq!(words[1].confidence, Some(0.6));
    }

    #[test]
    fn load_entries_fails_on_missing_file() {
        assert!(load_entries(Path::new("/nonexistent/transcript.json")).is_err());
    }
}
