//! Query text normalization used to group statistics.

/// Collapses runs of whitespace to one space, trims, and lower-cases.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
