//! Path segment grammars accepted by the HTTP surface.

/// Topic names: `[a-zA-Z0-9._-]+`.
pub fn is_valid_topic(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// Correlation ids as addressable by a query: `[a-zA-Z0-9_-]+`.
pub fn is_valid_correlation_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
}
