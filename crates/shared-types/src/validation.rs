//! Character-class validation for telegram tokens and path identifiers.

/// True when `s` is non-empty and every char is in `[A-Za-z0-9_-]`.
pub fn is_valid_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
