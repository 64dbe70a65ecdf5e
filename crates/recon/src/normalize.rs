//! Player-name normalization for identity matching.

/// Canonical match key for a free-text player name.
///
/// Lowercases, drops every character that is neither alphanumeric nor whitespace,
/// then sorts the whitespace-separated tokens so that "Rahm, Jon" and "Jon Rahm"
/// produce the same key.
pub fn normalize_name(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity of two already-normalized names in [0, 1].
///
/// Normalized Levenshtein similarity; two empty names are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    strsim::normalized_levenshtein(a, b)
}
