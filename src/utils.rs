/// Truncate a string to at most `max_chars` characters, respecting
/// char boundaries (byte-index slicing panics on multibyte text).
#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Like [`safe_truncate`] but appends an ellipsis when anything was cut.
#[inline]
pub fn safe_truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Canonical text fed to the embedding model for a concept.
///
/// Name and description are embedded together so near-identical ideas
/// with different titles still land close in vector space.
pub fn embedding_text(name: &str, description: &str) -> String {
    format!("name: {} description: {}", name, description)
}
