//! Maximal-marginal-relevance re-ranking over retrieval candidates

use tracing::debug;

use super::index::{cosine_similarity, RetrievedChunk, ScoredCandidate};

/// Greedily select up to `k` candidates, each maximizing
/// `lambda * relevance - (1 - lambda) * max_similarity_to_selected`.
///
/// Candidates must arrive in relevance order. Ties on the marginal score
/// keep the earlier candidate, so `lambda = 1.0` reduces to plain
/// relevance ranking. Selected results keep their original relevance
/// scores; the marginal score only drives selection.
///
/// When the pool is no larger than `k` there is nothing to trade away,
/// so the relevance order is returned untouched.
pub(crate) fn mmr_rerank(
    candidates: Vec<ScoredCandidate>,
    k: usize,
    lambda: f32,
) -> Vec<RetrievedChunk> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }
    if candidates.len() <= k {
        return candidates.into_iter().map(into_result).collect();
    }

    let pool = candidates.len();
    let mut remaining = candidates;
    let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(k);

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let redundancy = if selected.is_empty() {
                0.0
            } else {
                selected
                    .iter()
                    .map(|s| cosine_similarity(&candidate.embedding, &s.embedding))
                    .fold(f32::NEG_INFINITY, f32::max)
            };
            let marginal = lambda * candidate.score - (1.0 - lambda) * redundancy;

            if marginal > best_score {
                best_score = marginal;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    debug!(pool, selected = selected.len(), lambda, "diversity re-ranking applied");
    selected.into_iter().map(into_result).collect()
}

fn into_result(candidate: ScoredCandidate) -> RetrievedChunk {
    RetrievedChunk {
        chunk: candidate.chunk,
        score: candidate.score,
    }
}
