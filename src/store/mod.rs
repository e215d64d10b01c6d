//! Immutable model artifacts: factor tables, similarity matrices and titles
//!
//! Everything here is loaded once at startup and only read afterwards.

use chrono::{DateTime, Utc};

use crate::{
    config::Config,
    error::{AppResult, PredictionError},
    models::{EntityId, EntityKind, FactorVector},
};

pub mod catalog;
pub mod factors;
pub mod similarity;

pub use catalog::MovieCatalog;
pub use factors::FactorTable;
pub use similarity::SimilarityMatrix;

/// The trained model as seen by the predictor
#[derive(Debug, Clone)]
pub struct ModelStore {
    users: FactorTable,
    movies: FactorTable,
    user_similarity: Option<SimilarityMatrix>,
    movie_similarity: Option<SimilarityMatrix>,
    catalog: Option<MovieCatalog>,
    loaded_at: DateTime<Utc>,
}

impl ModelStore {
    pub fn new(users: FactorTable, movies: FactorTable) -> Self {
        Self {
            users,
            movies,
            user_similarity: None,
            movie_similarity: None,
            catalog: None,
            loaded_at: Utc::now(),
        }
    }

    pub fn with_similarity(mut self, kind: EntityKind, matrix: SimilarityMatrix) -> Self {
        match kind {
            EntityKind::User => self.user_similarity = Some(matrix),
            EntityKind::Movie => self.movie_similarity = Some(matrix),
        }
        self
    }

    pub fn with_catalog(mut self, catalog: MovieCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Loads every artifact named by the configuration
    pub fn load(config: &Config) -> AppResult<Self> {
        let users = FactorTable::from_path(EntityKind::User, &config.user_factors_path)?;
        let movies = FactorTable::from_path(EntityKind::Movie, &config.movie_factors_path)?;

        if let Some(rank) = config.factor_rank {
            users.check_rank(rank)?;
            movies.check_rank(rank)?;
        }

        if let (Some(user_dim), Some(movie_dim)) = (users.dimension(), movies.dimension()) {
            if user_dim != movie_dim {
                tracing::warn!(
                    user_dimension = user_dim,
                    movie_dimension = movie_dim,
                    "User and movie factors differ in length; every prediction will be unavailable"
                );
            }
        }

        let mut store = Self::new(users, movies);

        if let Some(path) = &config.user_similarity_path {
            store = store.with_similarity(EntityKind::User, SimilarityMatrix::from_path(path)?);
        }
        if let Some(path) = &config.movie_similarity_path {
            store = store.with_similarity(EntityKind::Movie, SimilarityMatrix::from_path(path)?);
        }
        if let Some(path) = &config.movie_titles_path {
            store = store.with_catalog(MovieCatalog::from_path(path)?);
        }

        Ok(store)
    }

    /// Stored factors for `id`, or `NotFound` when the table has none
    pub fn lookup(&self, kind: EntityKind, id: EntityId) -> Result<&FactorVector, PredictionError> {
        self.table(kind)
            .get(id)
            .ok_or(PredictionError::NotFound { kind, id })
    }

    pub fn table(&self, kind: EntityKind) -> &FactorTable {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Movie => &self.movies,
        }
    }

    pub fn similarity(&self, kind: EntityKind) -> Option<&SimilarityMatrix> {
        match kind {
            EntityKind::User => self.user_similarity.as_ref(),
            EntityKind::Movie => self.movie_similarity.as_ref(),
        }
    }

    pub fn catalog(&self) -> Option<&MovieCatalog> {
        self.catalog.as_ref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}
