//! Similarity ranking for "did you mean" suggestions.

use super::index::SearchIndex;
use super::key::decode_key;
use rapidfuzz::distance::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a key to be suggested.
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A key close to a query that matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion<'a> {
    pub key: &'a str,
    pub decoded: String,
    pub score: f64,
}

/// Ranks the decoded keys of `index` by similarity to `query`.
///
/// Only keys scoring above [`SUGGESTION_THRESHOLD`] are returned, best first;
/// ties keep key order.
pub fn suggest<'a>(index: &'a SearchIndex, query: &str, limit: usize) -> Vec<Suggestion<'a>> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return vec![];
    }

    let mut suggestions: Vec<_> = index
        .keys()
        .filter_map(|key| {
            let decoded = decode_key(key);
            let score = jaro_winkler::similarity(needle.chars(), decoded.to_lowercase().chars());
            (score > SUGGESTION_THRESHOLD).then_some(Suggestion {
                key,
                decoded,
                score,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
    suggestions.truncate(limit);
    suggestions
}
