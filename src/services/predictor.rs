use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::{
    error::PredictionError,
    models::{EntityId, EntityKind, FactorVector, Prediction, RatingRequest, UnavailableReason},
    services::fallback,
    store::ModelStore,
};

/// Lowest rating a prediction can carry
pub const MIN_RATING: f64 = 1.0;
/// Highest rating a prediction can carry
pub const MAX_RATING: f64 = 5.0;

/// Restricts a raw dot product to the rating scale
pub fn clamp_rating(raw: f64) -> f64 {
    raw.clamp(MIN_RATING, MAX_RATING)
}

/// Orders predictions by ascending user, then descending rating
///
/// Unavailable predictions come after every rated movie of the same user.
/// The sort is stable, so ties keep request order.
pub fn order_predictions(predictions: &mut [Prediction]) {
    predictions.sort_by(|a, b| {
        a.user
            .cmp(&b.user)
            .then_with(|| compare_ratings_descending(a.rating, b.rating))
    });
}

fn compare_ratings_descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Scores (user, movie) pairs against a loaded model
#[derive(Clone)]
pub struct Predictor {
    store: Arc<ModelStore>,
}

impl Predictor {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Stored factors for the entity, or an estimate from its exact-similarity neighbors
    pub fn resolve(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> Result<Cow<'_, FactorVector>, PredictionError> {
        match self.store.lookup(kind, id) {
            Ok(vector) => Ok(Cow::Borrowed(vector)),
            Err(PredictionError::NotFound { .. }) => fallback::estimate_with(
                kind,
                id,
                self.store.similarity(kind),
                self.store.table(kind),
            )
            .map(Cow::Owned),
            Err(other) => Err(other),
        }
    }

    /// Raw dot product of the resolved user and movie factors, before clamping
    ///
    /// An overflow to infinity is kept and later clamped; an overflow that
    /// cancels out into NaN has no rating.
    pub fn raw_rating(&self, request: RatingRequest) -> Result<f64, PredictionError> {
        let user = self.resolve(EntityKind::User, request.user)?;
        let movie = self.resolve(EntityKind::Movie, request.movie)?;

        let raw = user.dot(&movie).ok_or(PredictionError::DimensionMismatch {
            user: user.dimension(),
            movie: movie.dimension(),
        })?;

        if raw.is_nan() {
            return Err(PredictionError::UndefinedRating {
                user: request.user,
                movie: request.movie,
            });
        }
        Ok(raw)
    }

    /// Predicts a single rating
    pub fn predict(&self, request: RatingRequest) -> Prediction {
        let mut prediction = match self.raw_rating(request) {
            Ok(raw) => Prediction::available(request, clamp_rating(raw)),
            Err(err) => {
                tracing::debug!(
                    user = request.user,
                    movie = request.movie,
                    reason = %err,
                    "Prediction unavailable"
                );
                let reason = match err {
                    PredictionError::DimensionMismatch { .. } => {
                        UnavailableReason::DimensionMismatch
                    }
                    PredictionError::UndefinedRating { .. } => UnavailableReason::UndefinedRating,
                    PredictionError::NotFound { .. }
                    | PredictionError::NoFallbackAvailable { .. } => {
                        UnavailableReason::NoFallbackAvailable
                    }
                };
                Prediction::unavailable(request, reason)
            }
        };

        if let Some(catalog) = self.store.catalog() {
            prediction.title = catalog.title(request.movie).map(str::to_string);
        }

        prediction
    }

    /// Predicts every request and orders the results by user and rating
    ///
    /// A request that cannot be scored yields an unavailable prediction; the
    /// rest of the batch is unaffected.
    pub fn predict_batch(&self, requests: &[RatingRequest]) -> Vec<Prediction> {
        tracing::debug!(request_count = requests.len(), "Starting batch prediction");

        let mut predictions: Vec<Prediction> =
            requests.iter().map(|request| self.predict(*request)).collect();
        order_predictions(&mut predictions);

        let unavailable = predictions.iter().filter(|p| !p.is_available()).count();
        tracing::debug!(
            request_count = predictions.len(),
            unavailable,
            "Finished batch prediction"
        );

        predictions
    }
}
