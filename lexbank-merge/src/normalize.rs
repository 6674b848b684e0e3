//! Normalization-based text comparison.
//!
//! All equality and lookup matching in the engine goes through these
//! functions so that differing Unicode compositions of the same text are
//! never treated as conflicts, and label lookups ignore case.

use unicode_normalization::UnicodeNormalization;

/// Canonical decomposition (NFD) of a string.
#[must_use]
pub fn nfd(s: &str) -> String {
    s.nfd().collect()
}

/// Lookup key: canonical decomposition, lowercased, trimmed.
#[must_use]
pub fn fold_key(s: &str) -> String {
    s.trim().nfd().collect::<String>().to_lowercase()
}

/// True when two strings are canonically equivalent.
#[must_use]
pub fn text_eq(a: &str, b: &str) -> bool {
    a == b || nfd(a) == nfd(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_and_decomposed_are_equal() {
        // U+00E9 vs U+0065 U+0301
        assert!(text_eq("caf\u{e9}", "cafe\u{301}"));
        assert!(!text_eq("caf\u{e9}", "cafe"));
    }

    #[test]
    fn fold_key_ignores_case_and_outer_space() {
        assert_eq!(fold_key("  Noun "), fold_key("noun"));
        assert_eq!(fold_key("\u{c9}tude"), fold_key("e\u{301}tude"));
    }
}
