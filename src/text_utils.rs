//! Small text helpers shared by selection and gloss cleanup.

/// Characters dropped from either end of a selected word.
const WORD_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '{', '}', '\u{201C}', '\u{201D}',
    '\u{2018}', '\u{2019}', '\u{00AB}', '\u{00BB}', '\u{2026}', '-', '\u{2014}', '\u{2013}',
];

/// Strip surrounding punctuation and whitespace, keeping inner characters
/// (`don't` stays intact).
pub fn strip_surrounding_punctuation(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || WORD_PUNCTUATION.contains(&c))
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
