use super::MatchContext;
use crate::config::AlignerConfig;
use crate::types::{MatchKind, Token, TokenMatch, TranscribedWord};

const SKIP_WORD_COST: u32 = 1;
const SKIP_TOKEN_COST: u32 = 2;
const FUZZY_COST: u32 = 1;

#[derive(Debug, Clone, Copy)]
enum Step {
    Origin,
    SkipWord,
    SkipToken,
    Match { parts: usize, kind: MatchKind },
}

/// Minimum-cost alignment of the full token and word streams.
///
/// A token consumes one to `max_concat` words for free when they match
/// exactly, as a concatenation or as a known contraction; a fuzzy single
/// word costs [`FUZZY_COST`]. Leaving a token unmatched costs more than
/// dropping a transcribed word, so extra transcription noise is absorbed
/// before script tokens are given up. On equal cost a match beats a skip.
pub fn align_global(
    tokens: &[Token],
    words: &[TranscribedWord],
    config: &AlignerConfig,
) -> Vec<TokenMatch> {
    let n = tokens.len();
    let m = words.len();
    if n == 0 {
        return Vec::new();
    }

    let ctx = MatchContext::new(config, words);
    let width = m + 1;
    let mut cost = vec![u32::MAX; (n + 1) * width];
    let mut bp = vec![Step::Origin; (n + 1) * width];

    cost[0] = 0;
    for j in 1..=m {
        cost[j] = j as u32 * SKIP_WORD_COST;
        bp[j] = Step::SkipWord;
    }

    for i in 1..=n {
        let original = tokens[i - 1].normalized.as_str();
        let row = i * width;
        let prev_row = (i - 1) * width;

        for j in 0..=m {
            let mut best = cost[prev_row + j] + SKIP_TOKEN_COST;
            let mut step = Step::SkipToken;

            if j >= 1 {
                let cand = cost[row + j - 1] + SKIP_WORD_COST;
                if cand < best {
                    best = cand;
                    step = Step::SkipWord;
                }
                if let Some(distance) = ctx.fuzzy_distance(original, j - 1) {
                    let cand = cost[prev_row + j - 1] + FUZZY_COST;
                    if cand <= best {
                        best = cand;
                        step = Step::Match {
                            parts: 1,
                            kind: MatchKind::Fuzzy { distance },
                        };
                    }
                }
            }

            for parts in (1..=config.max_concat.min(j)).rev() {
                if let Some(kind) = ctx.match_run(original, j - parts, parts) {
                    let cand = cost[prev_row + j - parts];
                    if cand <= best {
                        best = cand;
                        step = Step::Match { parts, kind };
                    }
                }
            }

            cost[row + j] = best;
            bp[row + j] = step;
        }
    }

    let mut matches = vec![TokenMatch::unmatched(); n];
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        match bp[i * width + j] {
            Step::Match { parts, kind } => {
                matches[i - 1] = TokenMatch::matched((j - parts..j).collect(), kind);
                i -= 1;
                j -= parts;
            }
            Step::SkipToken => i -= 1,
            Step::SkipWord => j -= 1,
            Step::Origin => break,
        }
    }

    tracing::debug!(
        tokens = n,
        words = m,
        total_cost = cost[n * width + m],
        matched = matches.iter().filter(|t| t.is_matched()).count(),
        "global: alignment finished"
    );
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::matching::align_windowed;
    use crate::alignment::tokenization::tokenize_script;

    fn words(texts: &[&str]) -> Vec<TranscribedWord> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscribedWord::new(*t, i as u64 * 100, i as u64 * 100 + 100))
            .collect()
    }

    fn indices(matches: &[TokenMatch]) -> Vec<Vec<usize>> {
        matches.iter().map(|m| m.indices.clone()).collect()
    }

    #[test]
    fn empty_inputs() {
        let config = AlignerConfig::default();
        assert!(align_global(&[], &words(&["a"]), &config).is_empty());
        let tokens = tokenize_script("a b");
        let matches = align_global(&tokens, &[], &config);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| !m.is_matched()));
    }

    #[test]
    fn agrees_with_windowed_on_clean_input() {
        let config = AlignerConfig::default();
        let tokens = tokenize_script("The unconscious mind won't stop.");
        let ws = words(&["the", "un", "conscious", "mind", "won", "t", "stop"]);
        let global = align_global(&tokens, &ws, &config);
        let windowed = align_windowed(&tokens, &ws, &config);
        assert_eq!(indices(&global), indices(&windowed));
        assert_eq!(global[1].kind, Some(MatchKind::Concatenated { parts: 2 }));
        assert_eq!(global[3].kind, Some(MatchKind::Contraction { parts: 2 }));
    }

    #[test]
    fn long_insertion_is_skipped() {
        let config = AlignerConfig::default();
        let tokens = tokenize_script("hello there friend");
        let mut texts = vec!["hello"];
        texts.extend(std::iter::repeat("um").take(15));
        texts.extend(["there", "friend"]);
        let ws = words(&texts);

        let global = align_global(&tokens, &ws, &config);
        assert_eq!(indices(&global), vec![vec![0], vec![16], vec![17]]);

        let windowed = align_windowed(&tokens, &ws, &config);
        assert!(!windowed[1].is_matched());
    }

    #[test]
    fn unmatchable_token_is_left_for_interpolation() {
        let config = AlignerConfig::default();
        let tokens = tokenize_script("alpha zeta omega");
        let ws = words(&["alpha", "omega"]);
        let matches = align_global(&tokens, &ws, &config);
        assert_eq!(indices(&matches), vec![vec![0], vec![], vec![1]]);
    }

    #[test]
    fn fuzzy_pairs_are_used_when_cheaper_than_skipping() {
        let config = AlignerConfig::default();
        let tokens = tokenize_script("colour theory");
        let ws = words(&["color", "theory"]);
        let matches = align_global(&tokens, &ws, &config);
        assert_eq!(matches[0].kind, Some(MatchKind::Fuzzy { distance: 1 }));
        assert_eq!(matches[1].kind, Some(MatchKind::Exact));
    }

    #[test]
    fn indices_are_monotonic() {
        let config = AlignerConfig::default();
        let tokens = tokenize_script("a b c a b c");
        let ws = words(&["a", "b", "c", "x", "a", "b", "c"]);
        let matches = align_global(&tokens, &ws, &config);
        let flat: Vec<usize> = matches.iter().flat_map(|m| m.indices.clone()).collect();
        assert!(flat.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(flat.len(), 6);
    }
}
