//! Cosine ranking of stored chunk embeddings against a query embedding.

use std::cmp::Ordering;

use concierge_core::types::SimilarityCandidate;

/// Cosine similarity of two vectors. Returns 0 for mismatched lengths, empty
/// input or a zero-norm side, so the result is always finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    let score = dot / denom;
    if score.is_finite() { score } else { 0.0 }
}

/// Scores every candidate against `query` and orders them best first.
pub fn rank<T, V>(query: &[f32], candidates: impl IntoIterator<Item = (T, V)>) -> Vec<SimilarityCandidate<T>>
where
    V: AsRef<[f32]>,
{
    let scored = candidates
        .into_iter()
        .map(|(item, vector)| SimilarityCandidate { score: cosine_similarity(query, vector.as_ref()), item })
        .collect();
    order_by_score(scored)
}

/// Sorts by descending score. The sort is stable: equal scores keep their
/// input order.
pub fn order_by_score<T>(mut candidates: Vec<SimilarityCandidate<T>>) -> Vec<SimilarityCandidate<T>> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates
}

/// Keeps at most `k` of the already ordered candidates whose score is
/// strictly above `threshold`.
pub fn top_k_above<T>(ranked: Vec<SimilarityCandidate<T>>, threshold: f32, k: usize) -> Vec<SimilarityCandidate<T>> {
    ranked.into_iter().filter(|c| c.score > threshold).take(k).collect()
}
