use std::sync::Arc;

use crate::{config::Config, services::Predictor, store::ModelStore};

/// Shared application state
///
/// The model is read-only after startup, so it is shared without a lock.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub max_batch_size: usize,
}

impl AppState {
    pub fn new(store: ModelStore, config: &Config) -> Self {
        Self::with_batch_limit(store, config.max_batch_size)
    }

    pub fn with_batch_limit(store: ModelStore, max_batch_size: usize) -> Self {
        Self {
            predictor: Predictor::new(Arc::new(store)),
            max_batch_size,
        }
    }
}
