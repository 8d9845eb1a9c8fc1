use crate::config::{AlignerConfig, EmptyTranscriptionPolicy, MatchStrategy};
use crate::error::AlignmentError;
use crate::pipeline::builder::CaptionAlignerBuilder;
use crate::pipeline::runtime::CaptionAligner;
use crate::types::{AlignmentInput, AlignmentNotice, CaptionSource, MatchKind, TranscribedWord};

fn aligner() -> CaptionAligner {
    CaptionAlignerBuilder::default().build().expect("default build")
}

fn input(script: &str, words: &[(&str, u64, u64)]) -> AlignmentInput {
    AlignmentInput {
        script: script.to_string(),
        words: words
            .iter()
            .map(|(t, s, e)| TranscribedWord::new(*t, *s, *e))
            .collect(),
        total_duration_ms: None,
    }
}

fn spans(out: &crate::types::AlignmentOutput) -> Vec<(&str, u64, u64)> {
    out.captions
        .iter()
        .map(|c| (c.text.as_str(), c.start_ms, c.end_ms))
        .collect()
}

#[test]
fn simple_split_is_merged_and_leading_token_interpolated() {
    let out = aligner()
        .align(&input(
            "The unconscious mind.",
            &[
                ("Un", 0, 150),
                ("conscious", 150, 400),
                ("mind", 400, 600),
                (".", 600, 650),
            ],
        ))
        .expect("align");

    assert_eq!(
        spans(&out),
        vec![("The", 0, 0), ("unconscious", 0, 400), ("mind.", 400, 650)]
    );
    assert_eq!(out.sources[0], CaptionSource::Interpolated);
    assert_eq!(
        out.sources[1],
        CaptionSource::Aligned {
            kind: MatchKind::Exact
        }
    );
    assert_eq!(out.stats.merges, 2);
    assert_eq!(out.stats.transcribed_count, 4);
    assert_eq!(out.stats.corrected_count, 2);
    assert_eq!(out.stats.exact, 2);
    assert_eq!(out.stats.interpolated, 1);
    assert!(matches!(
        out.notices.as_slice(),
        [AlignmentNotice::UnmatchedToken { token_index: 0, .. }]
    ));
}

#[test]
fn split_contraction_is_merged() {
    let out = aligner()
        .align(&input(
            "won't stop",
            &[("won", 0, 100), ("'t", 100, 150), ("stop", 150, 400)],
        ))
        .expect("align");
    assert_eq!(spans(&out), vec![("won't", 0, 150), ("stop", 150, 400)]);
    assert_eq!(out.stats.merges, 1);
    assert_eq!(out.interpolated_count(), 0);
}

#[test]
fn contraction_without_apostrophe_matches() {
    let out = aligner()
        .align(&input(
            "I won't go",
            &[("I", 0, 100), ("wont", 100, 300), ("go", 300, 400)],
        ))
        .expect("align");
    assert_eq!(
        out.sources[1],
        CaptionSource::Aligned {
            kind: MatchKind::Contraction { parts: 1 }
        }
    );
    assert_eq!(out.stats.contraction, 1);
    assert_eq!((out.captions[1].start_ms, out.captions[1].end_ms), (100, 300));
}

#[test]
fn perfect_match_keeps_word_timing_and_confidence() {
    let mut data = input("Hello world", &[("hello", 10, 200), ("world", 220, 500)]);
    data.words[0].confidence = Some(0.9);
    let out = aligner().align(&data).expect("align");
    assert_eq!(spans(&out), vec![("Hello", 10, 200), ("world", 220, 500)]);
    assert_eq!(out.captions[0].confidence, Some(0.9));
    assert_eq!(out.captions[1].confidence, None);
    assert_eq!(out.captions[0].timestamp_ms, 105);
    assert!(out.notices.is_empty());
}

#[test]
fn empty_script_yields_empty_output() {
    let out = aligner()
        .align(&input("   ", &[("hello", 0, 100)]))
        .expect("align");
    assert!(out.captions.is_empty());
    assert!(out.sources.is_empty());
}

#[test]
fn empty_transcription_is_an_error_by_default() {
    let err = aligner().align(&input("a b", &[])).unwrap_err();
    assert!(matches!(
        err,
        AlignmentError::EmptyTranscription { token_count: 2 }
    ));
}

#[test]
fn empty_transcription_uniform_split() {
    let config = AlignerConfig {
        empty_transcription: EmptyTranscriptionPolicy::UniformSplit,
        ..AlignerConfig::default()
    };
    let aligner = CaptionAlignerBuilder::new(config).build().expect("build");

    let mut data = input("one two three", &[]);
    assert!(matches!(
        aligner.align(&data).unwrap_err(),
        AlignmentError::InvalidInput { .. }
    ));

    data.total_duration_ms = Some(900);
    let out = aligner.align(&data).expect("align");
    assert_eq!(
        spans(&out),
        vec![("one", 0, 300), ("two", 300, 600), ("three", 600, 900)]
    );
    assert!(out
        .sources
        .iter()
        .all(|s| *s == CaptionSource::UniformFallback));
}

#[test]
fn trailing_tokens_end_at_last_transcribed_word() {
    let mut data = input("hello world extra", &[("hello", 0, 100), ("world", 100, 200)]);
    data.total_duration_ms = Some(500);
    let out = aligner().align(&data).expect("align");
    assert_eq!(out.captions[2].start_ms, 200);
    assert_eq!(out.captions[2].end_ms, 200);

    let mut data = input("alpha zzzzzz", &[("alpha", 0, 100)]);
    data.total_duration_ms = Some(1000);
    let out = aligner().align(&data).expect("align");
    assert_eq!(spans(&out), vec![("alpha", 0, 100), ("zzzzzz", 100, 100)]);
    assert_eq!(out.sources[1], CaptionSource::Interpolated);
}

#[test]
fn reversed_word_span_is_clamped() {
    let data = AlignmentInput {
        script: "late".to_string(),
        words: vec![TranscribedWord {
            text: "late".to_string(),
            start_ms: 500,
            end_ms: 300,
            confidence: None,
        }],
        total_duration_ms: None,
    };
    let out = aligner().align(&data).expect("align");
    assert_eq!(spans(&out), vec![("late", 500, 500)]);
}

#[test]
fn repeated_words_never_go_backwards() {
    let out = aligner()
        .align(&input(
            "go go go",
            &[("go", 0, 100), ("go", 100, 200), ("go", 200, 300)],
        ))
        .expect("align");
    for pair in out.captions.windows(2) {
        assert!(pair[1].start_ms >= pair[0].end_ms);
    }
    assert_eq!(out.captions.len(), 3);
}

#[test]
fn global_strategy_aligns_long_insertions() {
    let words: Vec<(String, u64, u64)> = (0..15)
        .map(|i| (format!("filler{i}"), i * 100, i * 100 + 100))
        .chain(std::iter::once(("target".to_string(), 1500, 1600)))
        .collect();
    let word_refs: Vec<(&str, u64, u64)> =
        words.iter().map(|(t, s, e)| (t.as_str(), *s, *e)).collect();

    let global = CaptionAlignerBuilder::default()
        .with_match_strategy(MatchStrategy::Global)
        .build()
        .expect("build");
    let out = global.align(&input("target", &word_refs)).expect("align");
    assert_eq!(spans(&out), vec![("target", 1500, 1600)]);
}

#[test]
fn aligner_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CaptionAligner>();

    let aligner = std::sync::Arc::new(aligner());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let aligner = aligner.clone();
            std::thread::spawn(move || {
                aligner
                    .align(&input("a b", &[("a", 0, 10), ("b", 10, 20)]))
                    .map(|out| out.captions.len())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread").expect("align"), 2);
    }
}
