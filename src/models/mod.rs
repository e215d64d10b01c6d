use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod factor;
pub mod prediction;

pub use factor::FactorVector;
pub use prediction::{Prediction, RatingRequest, UnavailableReason};

/// Identifier of a user or a movie, as assigned by the ratings data
pub type EntityId = i64;

/// Which side of the rating matrix an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Movie,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Movie => write!(f, "movie"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(EntityKind::User),
            "movie" | "movies" => Ok(EntityKind::Movie),
            other => Err(format!("unknown entity kind '{}'", other)),
        }
    }
}
