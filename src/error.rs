use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{EntityId, EntityKind};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Io(_)
            | AppError::Csv(_)
            | AppError::MalformedData(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Outcomes of resolving factors for a single rating request
///
/// `NotFound` is the ordinary trigger for the similarity fallback and is never
/// produced by malformed data; the other variants end up as unavailable
/// predictions.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("{kind} {id} has no stored factors")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error("no similar {kind} with stored factors for {kind} {id}")]
    NoFallbackAvailable { kind: EntityKind, id: EntityId },

    #[error("user factors have {user} dimensions but movie factors have {movie}")]
    DimensionMismatch { user: usize, movie: usize },

    #[error("factors of user {user} and movie {movie} produce an undefined rating")]
    UndefinedRating { user: EntityId, movie: EntityId },
}

impl From<PredictionError> for AppError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::NotFound { .. } => AppError::NotFound(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
