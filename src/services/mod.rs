pub mod fallback;
pub mod predictor;

pub use predictor::Predictor;
