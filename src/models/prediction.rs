use serde::{Deserialize, Serialize};

use super::EntityId;

/// A (user, movie) pair to score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub user: EntityId,
    pub movie: EntityId,
}

impl RatingRequest {
    pub fn new(user: EntityId, movie: EntityId) -> Self {
        Self { user, movie }
    }
}

/// Why no rating could be produced for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The user or movie had no factors and no exact-similarity neighbor did either
    NoFallbackAvailable,
    /// User and movie factors have different lengths
    DimensionMismatch,
    /// The dot product overflowed into an undefined value
    UndefinedRating,
}

/// Predicted rating for one request
///
/// `rating` is `None` when the prediction is unavailable; callers must not
/// show it as a low score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub user: EntityId,
    pub movie: EntityId,
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<UnavailableReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Prediction {
    pub fn available(request: RatingRequest, rating: f64) -> Self {
        Self {
            user: request.user,
            movie: request.movie,
            rating: Some(rating),
            unavailable: None,
            title: None,
        }
    }

    pub fn unavailable(request: RatingRequest, reason: UnavailableReason) -> Self {
        Self {
            user: request.user,
            movie: request.movie,
            rating: None,
            unavailable: Some(reason),
            title: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.rating.is_some()
    }
}
