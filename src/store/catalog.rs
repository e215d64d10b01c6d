use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::EntityId,
};

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(alias = "movieId")]
    id: EntityId,
    title: String,
}

/// Movie titles keyed by movie id, read from a MovieLens-style `movies.csv`
#[derive(Debug, Clone, Default)]
pub struct MovieCatalog {
    titles: HashMap<EntityId, String>,
}

impl MovieCatalog {
    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut titles = HashMap::new();

        for row in csv_reader.deserialize::<MovieRow>() {
            let row = row?;
            if titles.contains_key(&row.id) {
                return Err(AppError::MalformedData(format!(
                    "duplicate movie id {} in movie catalog",
                    row.id
                )));
            }
            titles.insert(row.id, row.title);
        }

        Ok(Self { titles })
    }

    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let catalog = Self::from_reader(file)?;

        tracing::info!(
            path = %path.as_ref().display(),
            titles = catalog.len(),
            "Loaded movie catalog"
        );

        Ok(catalog)
    }

    pub fn title(&self, movie: EntityId) -> Option<&str> {
        self.titles.get(&movie).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
