//! Movie rating prediction from trained latent factors, with a
//! similarity-based fallback for users and movies the model has not seen.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
