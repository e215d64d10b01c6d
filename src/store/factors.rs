use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{EntityId, EntityKind, FactorVector},
};

/// One row of a trainer output file
#[derive(Debug, Deserialize)]
struct FactorRow {
    id: EntityId,
    features: String,
}

/// Latent factors of every known user (or every known movie)
#[derive(Debug, Clone)]
pub struct FactorTable {
    kind: EntityKind,
    dimension: Option<usize>,
    factors: HashMap<EntityId, FactorVector>,
}

impl FactorTable {
    /// Builds a table, rejecting duplicate ids and vectors of differing length
    pub fn from_entries<I>(kind: EntityKind, entries: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (EntityId, FactorVector)>,
    {
        let mut factors = HashMap::new();
        let mut dimension = None;

        for (id, vector) in entries {
            match dimension {
                None => dimension = Some(vector.dimension()),
                Some(expected) if expected != vector.dimension() => {
                    return Err(AppError::MalformedData(format!(
                        "{} {} has {} factors, expected {}",
                        kind,
                        id,
                        vector.dimension(),
                        expected
                    )));
                }
                Some(_) => {}
            }

            if factors.insert(id, vector).is_some() {
                return Err(AppError::MalformedData(format!(
                    "duplicate {} id {} in factor table",
                    kind, id
                )));
            }
        }

        Ok(Self {
            kind,
            dimension,
            factors,
        })
    }

    /// Reads `id,features` rows; other columns are ignored
    pub fn from_reader<R: Read>(kind: EntityKind, reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut entries = Vec::new();

        for row in csv_reader.deserialize::<FactorRow>() {
            let row = row?;
            let vector = FactorVector::parse(&row.features)
                .map_err(|e| AppError::MalformedData(format!("{} {}: {}", kind, row.id, e)))?;
            entries.push((row.id, vector));
        }

        Self::from_entries(kind, entries)
    }

    pub fn from_path(kind: EntityKind, path: impl AsRef<Path>) -> AppResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let table = Self::from_reader(kind, file)?;

        tracing::info!(
            kind = %kind,
            path = %path.as_ref().display(),
            entries = table.len(),
            dimension = ?table.dimension(),
            "Loaded factor table"
        );

        Ok(table)
    }

    /// Fails unless every vector has exactly `rank` factors
    pub fn check_rank(&self, rank: usize) -> AppResult<()> {
        match self.dimension {
            Some(dimension) if dimension != rank => Err(AppError::MalformedData(format!(
                "{} factors have {} dimensions, configured rank is {}",
                self.kind, dimension, rank
            ))),
            _ => Ok(()),
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&FactorVector> {
        self.factors.get(&id)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Shared dimensionality, `None` for an empty table
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
