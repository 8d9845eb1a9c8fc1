use super::MatchContext;
use crate::config::AlignerConfig;
use crate::types::{MatchKind, Token, TokenMatch, TranscribedWord};

/// Greedy bounded search around a single forward cursor.
///
/// For each token the window `[cursor - lookbehind, cursor + lookahead)` is
/// scanned in order; at every start index a single word is tried before two-
/// and three-word runs. Without a hit the word under the cursor gets one
/// fuzzy attempt. After a hit the cursor sits one past the last consumed word,
/// which moves it back when the hit came from the lookbehind.
pub fn align_windowed(
    tokens: &[Token],
    words: &[TranscribedWord],
    config: &AlignerConfig,
) -> Vec<TokenMatch> {
    let ctx = MatchContext::new(config, words);
    let mut cursor = 0usize;
    let mut matches = Vec::with_capacity(tokens.len());

    for (token_idx, token) in tokens.iter().enumerate() {
        let found = search_window(&ctx, &token.normalized, cursor, config);
        let token_match = match found {
            Some(m) => m,
            None => match ctx.fuzzy_distance(&token.normalized, cursor) {
                Some(distance) => TokenMatch::matched(vec![cursor], MatchKind::Fuzzy { distance }),
                None => TokenMatch::unmatched(),
            },
        };

        if let Some(&last) = token_match.indices.last() {
            cursor = last + 1;
            tracing::debug!(
                token_idx,
                token = token.text.as_str(),
                first = token_match.indices[0],
                last,
                kind = ?token_match.kind,
                cursor,
                "windowed: token matched"
            );
        } else {
            tracing::debug!(token_idx, token = token.text.as_str(), cursor, "windowed: no match");
        }
        matches.push(token_match);
    }
    matches
}

fn search_window(
    ctx: &MatchContext<'_>,
    original: &str,
    cursor: usize,
    config: &AlignerConfig,
) -> Option<TokenMatch> {
    let window_start = cursor.saturating_sub(config.lookbehind);
    let window_end = ctx.len().min(cursor.saturating_add(config.lookahead));
    for start in window_start..window_end {
        for parts in 1..=config.max_concat {
            if let Some(kind) = ctx.match_run(original, start, parts) {
                return Some(TokenMatch::matched((start..start + parts).collect(), kind));
            }
        }
    }
    None
}
