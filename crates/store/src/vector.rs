//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and top-n ranking over embedded documents.

use colloquy_core::search::{Document, SearchHit};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 =
/// opposite. Returns 0.0 if the vectors are empty or differ in length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank embedded documents by cosine similarity to a query embedding.
///
/// Returns the top `limit` hits sorted by descending similarity, with the
/// hit score set to the cosine value.
pub fn rank_by_similarity(
    candidates: Vec<(Document, Vec<f32>)>,
    query_embedding: &[f32],
    limit: usize,
) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .map(|(document, embedding)| SearchHit {
            score: cosine_similarity(&embedding, query_embedding),
            document,
        })
        .collect();

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}
