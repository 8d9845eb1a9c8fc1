/// Comparison-only form of a word: lowercased, with everything outside
/// `[a-z0-9']` removed. Never shown to the user.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '\'')
        .collect()
}

/// Normalized form with apostrophes dropped, used for contraction equivalence.
pub(crate) fn strip_apostrophes(normalized: &str) -> String {
    normalized.chars().filter(|&c| c != '\'').collect()
}
