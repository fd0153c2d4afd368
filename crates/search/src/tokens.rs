/// Split one identifier segment at camel-case boundaries and lowercase the
/// pieces. Runs of capitals split letter by letter ("HTTPServer" yields
/// h, t, t, p, server); queries written in lowercase still hit them via the
/// trailing word.
#[must_use]
pub fn split_identifier(segment: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for ch in segment.chars() {
        if ch.is_ascii_uppercase() && !current.is_empty() {
            parts.push(current.to_lowercase());
            current = String::new();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current.to_lowercase());
    }
    parts
}

/// Tokenize free text or source code into lowercase terms. Any character
/// outside ASCII alphanumerics separates tokens (so snake_case splits at
/// underscores), then each token splits again at camel-case boundaries.
/// Query strings and document texts go through this same function, which is
/// what keeps their term spaces aligned.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .flat_map(split_identifier)
        .collect()
}
