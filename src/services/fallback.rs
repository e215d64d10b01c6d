use crate::{
    error::PredictionError,
    models::{EntityId, EntityKind, FactorVector},
    store::{FactorTable, SimilarityMatrix},
};

/// Decimal places similarities are rounded to before the neighbor test
const SIMILARITY_DECIMALS: i32 = 5;

/// Rounded similarity a neighbor must reach to stand in for the missing entity
const NEIGHBOR_THRESHOLD: f64 = 1.0;

fn round_similarity(similarity: f64) -> f64 {
    let scale = 10f64.powi(SIMILARITY_DECIMALS);
    (similarity * scale).round() / scale
}

/// Ids whose similarity to `id` rounds to at least 1.0, excluding `id`, in ascending order
pub fn exact_neighbors(id: EntityId, similarity: &SimilarityMatrix) -> Vec<EntityId> {
    let mut neighbors: Vec<EntityId> = similarity
        .similarities_to(id)
        .map(|column| {
            column
                .filter(|(other, score)| {
                    *other != id && round_similarity(*score) >= NEIGHBOR_THRESHOLD
                })
                .map(|(other, _)| other)
                .collect()
        })
        .unwrap_or_default();

    neighbors.sort_unstable();
    neighbors
}

/// Estimates factors for an entity missing from `factors`
///
/// Averages the stored factors of every exact-similarity neighbor. Neighbors
/// without stored factors are skipped. Fails with `NoFallbackAvailable` when
/// nothing is left to average.
pub fn estimate(
    id: EntityId,
    similarity: &SimilarityMatrix,
    factors: &FactorTable,
) -> Result<FactorVector, PredictionError> {
    let kind = factors.kind();
    let neighbors = exact_neighbors(id, similarity);

    let vectors: Vec<&FactorVector> = neighbors
        .iter()
        .filter_map(|neighbor| factors.get(*neighbor))
        .collect();

    tracing::debug!(
        kind = %kind,
        id,
        neighbors = neighbors.len(),
        with_factors = vectors.len(),
        "Estimating factors from similar entities"
    );

    FactorVector::mean(vectors).ok_or(PredictionError::NoFallbackAvailable { kind, id })
}

/// Runs `estimate` when the similarity matrix for `kind` is loaded
pub fn estimate_with(
    kind: EntityKind,
    id: EntityId,
    similarity: Option<&SimilarityMatrix>,
    factors: &FactorTable,
) -> Result<FactorVector, PredictionError> {
    match similarity {
        Some(matrix) => estimate(id, matrix, factors),
        None => {
            tracing::debug!(kind = %kind, id, "No similarity matrix loaded");
            Err(PredictionError::NoFallbackAvailable { kind, id })
        }
    }
}
