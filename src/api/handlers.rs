use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{EntityId, EntityKind, FactorVector, Prediction, RatingRequest},
    store::ModelStore,
};

use super::AppState;

// Response types

#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub entries: usize,
    pub dimension: Option<usize>,
    /// Entities covered by the similarity matrix, absent when none is loaded
    pub similarity_entities: Option<usize>,
}

impl TableInfo {
    fn describe(store: &ModelStore, kind: EntityKind) -> Self {
        let table = store.table(kind);
        Self {
            entries: table.len(),
            dimension: table.dimension(),
            similarity_entities: store.similarity(kind).map(|matrix| matrix.len()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub users: TableInfo,
    pub movies: TableInfo,
    pub catalog_titles: Option<usize>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FactorResponse {
    pub kind: EntityKind,
    pub id: EntityId,
    pub features: FactorVector,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Sizes and shapes of the loaded model
pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    let store = state.predictor.store();
    Json(ModelInfoResponse {
        users: TableInfo::describe(store, EntityKind::User),
        movies: TableInfo::describe(store, EntityKind::Movie),
        catalog_titles: store.catalog().map(|catalog| catalog.len()),
        loaded_at: store.loaded_at(),
    })
}

/// Stored factors of one user or movie
pub async fn get_factors(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, EntityId)>,
) -> AppResult<Json<FactorResponse>> {
    let kind: EntityKind = kind.parse().map_err(AppError::InvalidInput)?;
    let features = state.predictor.store().lookup(kind, id)?.clone();

    Ok(Json(FactorResponse { kind, id, features }))
}

/// Predicts the rating of a single (user, movie) pair
pub async fn predict(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RatingRequest>,
) -> Json<Prediction> {
    let prediction = state.predictor.predict(request);

    tracing::info!(
        request_id = %request_id,
        user = request.user,
        movie = request.movie,
        rating = ?prediction.rating,
        "Prediction served"
    );

    Json(prediction)
}

/// Predicts a batch of requests, ordered by user and descending rating
pub async fn predict_batch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(requests): Json<Vec<RatingRequest>>,
) -> AppResult<Json<Vec<Prediction>>> {
    if requests.is_empty() {
        return Err(AppError::InvalidInput(
            "Must provide at least one request".to_string(),
        ));
    }
    if requests.len() > state.max_batch_size {
        return Err(AppError::InvalidInput(format!(
            "Batch of {} requests exceeds the limit of {}",
            requests.len(),
            state.max_batch_size
        )));
    }

    tracing::info!(
        request_id = %request_id,
        request_count = requests.len(),
        "Processing prediction batch"
    );

    let predictor = state.predictor.clone();
    let predictions = tokio::task::spawn_blocking(move || predictor.predict_batch(&requests))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(
        request_id = %request_id,
        unavailable = predictions.iter().filter(|p| !p.is_available()).count(),
        "Prediction batch completed"
    );

    Ok(Json(predictions))
}
