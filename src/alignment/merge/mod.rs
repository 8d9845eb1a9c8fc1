use crate::alignment::normalize::normalize;
use crate::types::TranscribedWord;

pub mod rules;
#[cfg(test)]
mod tests;

pub use rules::{default_rule_table, MergeRule, MergeRuleTable, Pattern};

/// Single marks folded into the word before them.
const CLOSING_PUNCTUATION: [char; 11] = ['.', ',', '!', '?', ';', ':', '\'', '"', ')', ']', '}'];
/// Marks that open the word after them.
const OPENING_PUNCTUATION: [char; 5] = ['"', '\'', '(', '[', '{'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeAmbiguity {
    /// Index into the input transcription.
    pub position: usize,
    pub text: String,
    pub applied_rule: usize,
    pub candidate_rules: Vec<usize>,
}

/// Opening marks that start a new unit when glued to a word (`"run`, `(al`).
const UNIT_OPENERS: [char; 4] = ['"', '(', '[', '{'];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeOutcome {
    pub words: Vec<TranscribedWord>,
    pub merges: usize,
    pub ambiguities: Vec<MergeAmbiguity>,
}

fn single_mark(text: &str, set: &[char]) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if set.contains(&c))
}

/// A word already opened by a quote or bracket never folds into its predecessor.
/// A word already closed by trailing punctuation never starts a rule match.
fn starts_unit(text: &str) -> bool {
    let mut chars = text.chars();
    matches!((chars.next(), chars.next()), (Some(c), Some(_)) if UNIT_OPENERS.contains(&c))
}

fn leading_marks(text: &str) -> &str {
    let end = text
        .find(|c: char| !OPENING_PUNCTUATION.contains(&c))
        .unwrap_or(text.len());
    &text[..end]
}

fn trailing_marks(text: &str) -> &str {
    let start = text
        .rfind(|c: char| !CLOSING_PUNCTUATION.contains(&c))
        .map(|idx| idx + text[idx..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    &text[start..]
}

/// `min` over the confidences that are present.
pub(crate) fn min_confidence(a: Option<f32>, b: Option<f32>) -> Option<f32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn emit_with_prefix(
    out: &mut Vec<TranscribedWord>,
    pending: &mut Option<TranscribedWord>,
    mut entry: TranscribedWord,
) {
    if let Some(prefix) = pending.take() {
        entry.text = format!("{}{}", prefix.text, entry.text);
        entry.start_ms = prefix.start_ms.min(entry.start_ms);
        entry.confidence = min_confidence(prefix.confidence, entry.confidence);
    }
    out.push(entry);
}

/// Repairs transcription splits in one left-to-right pass.
///
/// Per position the first applicable repair wins: a forward table rule, a
/// backward table rule, a lone closing mark joining the previous word, then a
/// lone opening mark becoming the prefix of whatever is emitted next. Words
/// are never reordered and every step consumes at least one input word.
pub fn merge_split_words(words: &[TranscribedWord], table: &MergeRuleTable) -> MergeOutcome {
    let mut out: Vec<TranscribedWord> = Vec::with_capacity(words.len());
    let mut merges = 0usize;
    let mut ambiguities = Vec::new();
    let mut pending_prefix: Option<TranscribedWord> = None;
    let mut i = 0usize;

    while i < words.len() {
        let current = &words[i];
        let current_text = current.text.trim();
        let current_norm = normalize(current_text);

        if let Some(next) = words.get(i + 1) {
            let next_text = next.text.trim();
            let hits = if starts_unit(next_text) || !trailing_marks(current_text).is_empty() {
                Vec::new()
            } else {
                table.forward_matches(&current_norm, &normalize(next_text))
            };
            if let Some(&rule_idx) = hits.first() {
                let text = match table.rule(rule_idx).and_then(MergeRule::merged_text) {
                    Some(merged) => format!(
                        "{}{merged}{}",
                        leading_marks(current_text),
                        trailing_marks(next_text)
                    ),
                    None => format!("{current_text}{next_text}"),
                };
                tracing::debug!(
                    current = current_text,
                    next = next_text,
                    merged = text.as_str(),
                    rule = rule_idx,
                    "merge: forward rule"
                );
                if hits.len() > 1 {
                    ambiguities.push(MergeAmbiguity {
                        position: i,
                        text: current_text.to_string(),
                        applied_rule: rule_idx,
                        candidate_rules: hits,
                    });
                }
                emit_with_prefix(
                    &mut out,
                    &mut pending_prefix,
                    TranscribedWord {
                        text,
                        start_ms: current.start_ms,
                        end_ms: next.end_ms.max(current.start_ms),
                        confidence: min_confidence(current.confidence, next.confidence),
                    },
                );
                merges += 1;
                i += 2;
                continue;
            }
        }

        let joins_previous = pending_prefix.is_none() && !starts_unit(current_text);

        if joins_previous {
            if let Some(prev) = out.last_mut() {
                let hits = if trailing_marks(&prev.text).is_empty() {
                    table.backward_matches(&normalize(&prev.text), &current_norm)
                } else {
                    Vec::new()
                };
                if let Some(&rule_idx) = hits.first() {
                    let text = match table.rule(rule_idx).and_then(MergeRule::merged_text) {
                        Some(merged) => format!(
                            "{}{merged}{}",
                            leading_marks(&prev.text),
                            trailing_marks(current_text)
                        ),
                        None => format!("{}{current_text}", prev.text),
                    };
                    tracing::debug!(
                        prev = prev.text.as_str(),
                        current = current_text,
                        merged = text.as_str(),
                        rule = rule_idx,
                        "merge: backward rule"
                    );
                    if hits.len() > 1 {
                        ambiguities.push(MergeAmbiguity {
                            position: i,
                            text: current_text.to_string(),
                            applied_rule: rule_idx,
                            candidate_rules: hits,
                        });
                    }
                    prev.text = text;
                    prev.end_ms = current.end_ms.max(prev.end_ms);
                    prev.confidence = min_confidence(prev.confidence, current.confidence);
                    merges += 1;
                    i += 1;
                    continue;
                }
            }

            if single_mark(current_text, &CLOSING_PUNCTUATION) {
                if let Some(prev) = out.last_mut() {
                    prev.text.push_str(current_text);
                    prev.end_ms = current.end_ms.max(prev.end_ms);
                    merges += 1;
                    i += 1;
                    continue;
                }
            }
        }

        if single_mark(current_text, &OPENING_PUNCTUATION) && i + 1 < words.len() {
            let mark = TranscribedWord {
                text: current_text.to_string(),
                ..current.clone()
            };
            pending_prefix = Some(match pending_prefix.take() {
                Some(mut prefix) => {
                    prefix.text.push_str(&mark.text);
                    prefix.confidence = min_confidence(prefix.confidence, mark.confidence);
                    prefix
                }
                None => mark,
            });
            merges += 1;
            i += 1;
            continue;
        }

        emit_with_prefix(
            &mut out,
            &mut pending_prefix,
            TranscribedWord {
                text: current_text.to_string(),
                ..current.clone()
            },
        );
        i += 1;
    }

    tracing::debug!(
        input_words = words.len(),
        output_words = out.len(),
        merges,
        "merge: split repair finished"
    );

    MergeOutcome {
        words: out,
        merges,
        ambiguities,
    }
}
