use crate::types::Token;

/// Marks that ride along with the word before them.
pub const ATTACHED_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

fn is_attached_punctuation(c: char) -> bool {
    ATTACHED_PUNCTUATION.contains(&c)
}

/// Splits a script into caption tokens.
///
/// Whitespace separates tokens and trailing punctuation stays on its word
/// (`"mind."` is one token). A run of marks standing on its own between
/// spaces (`"wait , what"`) yields one token per mark.
pub fn tokenize_script(script: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for chunk in script.split_whitespace() {
        if chunk.chars().all(is_attached_punctuation) {
            tokens.extend(chunk.chars().map(|c| Token::new(c.to_string())));
            continue;
        }
        tokens.push(Token::new(chunk));
    }
    tokens
}
