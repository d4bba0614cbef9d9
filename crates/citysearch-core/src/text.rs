// crates/citysearch-core/src/text.rs

/// Convert a string into a folded key suitable for indexing and comparison.
///
/// This performs:
/// 1\) Transliterate Unicode → ASCII (e.g. `Española` -> `Espanola`)
/// 2\) Normalize to lowercase
///
/// # Examples
///
/// ```rust
/// use citysearch_core::text::fold_key;
///
/// assert_eq!(fold_key("Cañon City"), "canon city");
/// assert_eq!(fold_key("PHOENIX"), "phoenix");
/// ```
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase()
}

/// Compares two strings for equality after Unicode folding and normalization.
///
/// ```rust
/// use citysearch_core::text::equals_folded;
///
/// assert!(equals_folded("Española", "espanola"));
/// assert!(!equals_folded("Austin", "Boston"));
/// ```
pub fn equals_folded(a: &str, b: &str) -> bool {
    fold_key(a) == fold_key(b)
}

/// Number of characters in `s` once surrounding whitespace is removed.
///
/// Query length checks count characters, not bytes, so `"ñy"` is two long.
pub fn query_len(s: &str) -> usize {
    s.trim().chars().count()
}

/// `true` when `s` is exactly two ASCII letters, the shape of a state code.
pub fn is_state_code_shape(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Parses an optional numeric field, treating blanks and junk as absent.
pub(crate) fn parse_opt<T: std::str::FromStr>(s: &str) -> Option<T> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_case() {
        assert_eq!(fold_key("Española"), "espanola");
        assert_eq!(fold_key("St. Louis"), "st. louis");
    }

    #[test]
    fn query_len_counts_trimmed_chars() {
        assert_eq!(query_len("  a "), 1);
        assert_eq!(query_len("ñy"), 2);
        assert_eq!(query_len(""), 0);
    }

    #[test]
    fn state_code_shape() {
        assert!(is_state_code_shape("tx"));
        assert!(is_state_code_shape("NY"));
        assert!(!is_state_code_shape("T1"));
        assert!(!is_state_code_shape("TEX"));
    }

    #[test]
    fn parse_opt_handles_blanks() {
        assert_eq!(parse_opt::<f64>(" 33.45 "), Some(33.45));
        assert_eq!(parse_opt::<f64>(""), None);
        assert_eq!(parse_opt::<u32>("n/a"), None);
    }
}
