use super::rules::{MergeRuleTable, PatternSpec};
use super::*;

fn word(text: &str, start: u64, end: u64) -> TranscribedWord {
    TranscribedWord::new(text, start, end)
}

fn texts(outcome: &MergeOutcome) -> Vec<&str> {
    outcome.words.iter().map(|w| w.text.as_str()).collect()
}

#[test]
fn forward_rule_merges_split_word() {
    let words = vec![
        word("Un", 0, 150),
        word("conscious", 150, 400),
        word("mind", 400, 600),
        word(".", 600, 650),
    ];
    let outcome = merge_split_words(&words, &default_rule_table());
    assert_eq!(texts(&outcome), ["Unconscious", "mind."]);
    assert_eq!(outcome.words[0].start_ms, 0);
    assert_eq!(outcome.words[0].end_ms, 400);
    assert_eq!(outcome.words[1].start_ms, 400);
    assert_eq!(outcome.words[1].end_ms, 650);
    assert_eq!(outcome.merges, 2);
}

#[test]
fn forward_merge_takes_min_confidence() {
    let words = vec![
        word("won", 0, 100).with_confidence(0.9),
        word("'t", 100, 150).with_confidence(0.4),
    ];
    let outcome = merge_split_words(&words, &default_rule_table());
    assert_eq!(texts(&outcome), ["won't"]);
    assert_eq!(outcome.words[0].confidence, Some(0.4));
}

#[test]
fn missing_confidence_does_not_erase_present_one() {
    assert_eq!(min_confidence(None, Some(0.7)), Some(0.7));
    assert_eq!(min_confidence(Some(0.2), None), Some(0.2));
    assert_eq!(min_confidence(None, None), None);
}

#[test]
fn backward_rule_rewrites_previous_entry() {
    let words = vec![word("front", 0, 200), word("al", 200, 300), word("lobe", 300, 500)];
    let outcome = merge_split_words(&words, &default_rule_table());
    assert_eq!(texts(&outcome), ["frontal", "lobe"]);
    assert_eq!(outcome.words[0].start_ms, 0);
    assert_eq!(outcome.words[0].end_ms, 300);
    assert_eq!(outcome.merges, 1);
}

#[test]
fn rule_without_merged_text_concatenates() {
    let table = MergeRuleTable::new(
        1,
        vec![MergeRule::Forward {
            current: Pattern::literal("hyper"),
            next: Pattern::literal("drive"),
            merged: None,
        }],
    );
    let outcome = merge_split_words(&[word(" Hyper", 0, 10), word("drive ", 10, 20)], &table);
    assert_eq!(texts(&outcome), ["Hyperdrive"]);
}

#[test]
fn closing_mark_joins_previous_word() {
    let words = vec![word("Hello", 0, 100), word(",", 100, 110), word("world", 110, 300), word("!", 300, 320)];
    let outcome = merge_split_words(&words, &MergeRuleTable::empty());
    assert_eq!(texts(&outcome), ["Hello,", "world!"]);
    assert_eq!(outcome.words[1].end_ms, 320);
}

#[test]
fn leading_mark_without_previous_passes_through() {
    let words = vec![word(".", 0, 10), word("go", 10, 100)];
    let outcome = merge_split_words(&words, &MergeRuleTable::empty());
    assert_eq!(texts(&outcome), [".", "go"]);
    assert_eq!(outcome.merges, 0);
}

#[test]
fn opening_mark_prefixes_next_word() {
    let words = vec![word("(", 0, 20), word("quietly", 20, 200), word(")", 200, 210)];
    let outcome = merge_split_words(&words, &MergeRuleTable::empty());
    assert_eq!(texts(&outcome), ["(quietly)"]);
    assert_eq!(outcome.words[0].start_ms, 0);
    assert_eq!(outcome.words[0].end_ms, 210);
}

#[test]
fn quote_after_word_closes_rather_than_opens() {
    let words = vec![word("said", 0, 100), word("\"", 100, 110), word("run", 110, 200)];
    let outcome = merge_split_words(&words, &MergeRuleTable::empty());
    assert_eq!(texts(&outcome), ["said\"", "run"]);
}

#[test]
fn unmatched_words_pass_through_trimmed() {
    let words = vec![word(" the", 0, 100), word(" radar ", 100, 300)];
    let outcome = merge_split_words(&words, &default_rule_table());
    assert_eq!(texts(&outcome), ["the", "radar"]);
    assert_eq!(outcome.merges, 0);
    assert!(outcome.ambiguities.is_empty());
}

#[test]
fn empty_input_yields_empty_output() {
    let outcome = merge_split_words(&[], &default_rule_table());
    assert!(outcome.words.is_empty());
    assert_eq!(outcome.merges, 0);
}

#[test]
fn first_rule_in_table_order_wins_and_ambiguity_is_reported() {
    let spec = rules::MergeRuleTableSpec {
        version: 2,
        rules: vec![
            rules::MergeRuleSpec::Forward {
                current: PatternSpec::Literal("dis".into()),
                next: PatternSpec::Literal("miss".into()),
                merged: Some("dismiss".into()),
            },
            rules::MergeRuleSpec::Forward {
                current: PatternSpec::AnyOf(vec!["dis".into(), "mis".into()]),
                next: PatternSpec::Regex {
                    regex: "^miss$".into(),
                },
                merged: Some("DISMISS".into()),
            },
        ],
    };
    let table = MergeRuleTable::from_spec(&spec).expect("valid spec");
    let outcome = merge_split_words(&[word("dis", 0, 50), word("miss", 50, 120)], &table);
    assert_eq!(texts(&outcome), ["dismiss"]);
    assert_eq!(outcome.ambiguities.len(), 1);
    assert_eq!(outcome.ambiguities[0].applied_rule, 0);
    assert_eq!(outcome.ambiguities[0].candidate_rules, vec![0, 1]);
}

#[test]
fn merging_is_idempotent() {
    let words = vec![
        word("\"", 0, 10),
        word("Un", 10, 150),
        word("conscious", 150, 400),
        word("front", 400, 500),
        word("al", 500, 550),
        word("signals", 550, 700),
        word("won", 700, 800),
        word("'t", 800, 850),
        word("stop", 850, 1000),
        word(".", 1000, 1010),
        word("(", 1010, 1020),
        word("neuro", 1020, 1100),
        word("science", 1100, 1300),
        word(")", 1300, 1310),
    ];
    let table = default_rule_table();
    let once = merge_split_words(&words, &table);
    let twice = merge_split_words(&once.words, &table);
    assert_eq!(once.words, twice.words);
    assert_eq!(twice.merges, 0);
}

#[test]
fn merged_spans_stay_ordered() {
    let words = vec![word("Em", 100, 200), word("otional", 180, 150)];
    let outcome = merge_split_words(&words, &default_rule_table());
    assert_eq!(texts(&outcome), ["Emotional"]);
    assert!(outcome.words[0].start_ms <= outcome.words[0].end_ms);
}

#[test]
fn opening_quote_does_not_hide_a_split_word() {
    let words = vec![word("\"", 0, 10), word("Un", 10, 150), word("conscious", 150, 400)];
    let outcome = merge_split_words(&words, &default_rule_table());
    assert_eq!(texts(&outcome), ["\"Unconscious"]);
    assert_eq!(outcome.words[0].start_ms, 0);
    assert_eq!(outcome.words[0].end_ms, 400);
}

#[test]
fn opened_word_never_folds_backward() {
    let words = vec![word("front", 0, 100), word("(", 100, 110), word("al", 110, 200)];
    let table = default_rule_table();
    let once = merge_split_words(&words, &table);
    assert_eq!(texts(&once), ["front", "(al"]);
    let twice = merge_split_words(&once.words, &table);
    assert_eq!(once.words, twice.words);
}

#[test]
fn punctuation_between_rule_pieces_blocks_the_rule() {
    let words = vec![word("won", 0, 100), word(",", 100, 110), word("'t", 110, 150)];
    let table = default_rule_table();
    let once = merge_split_words(&words, &table);
    assert_eq!(texts(&once), ["won,", "'t"]);
    let twice = merge_split_words(&once.words, &table);
    assert_eq!(once.words, twice.words);

    let words = vec![word("ign", 0, 100), word(",", 100, 110), word("als", 110, 200)];
    let once = merge_split_words(&words, &table);
    assert_eq!(texts(&once), ["ign,", "als"]);
}
