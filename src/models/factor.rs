use serde::Serialize;

/// Latent feature vector of one user or one movie
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FactorVector(Vec<f64>);

impl FactorVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Parses the stored `features` column, a list literal such as `[0.1, -2.5, 1e-05]`
    pub fn parse(text: &str) -> Result<Self, String> {
        let values: Vec<f64> = serde_json::from_str(text.trim())
            .map_err(|e| format!("features '{}' are not a list of numbers: {}", text, e))?;

        if values.is_empty() {
            return Err("features list is empty".to_string());
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(format!("features contain a non-finite value {}", bad));
        }

        Ok(Self(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Dot product, or `None` when the dimensions differ
    pub fn dot(&self, other: &FactorVector) -> Option<f64> {
        if self.dimension() != other.dimension() {
            return None;
        }
        Some(self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum())
    }

    /// Element-wise arithmetic mean
    ///
    /// Returns `None` for an empty input. All vectors must share one
    /// dimension; a vector of a different length makes the mean undefined and
    /// also yields `None`.
    pub fn mean<'a, I>(vectors: I) -> Option<FactorVector>
    where
        I: IntoIterator<Item = &'a FactorVector>,
    {
        let mut iter = vectors.into_iter();
        let mut sum = iter.next()?.0.clone();
        let mut count = 1usize;

        for vector in iter {
            if vector.dimension() != sum.len() {
                return None;
            }
            for (acc, v) in sum.iter_mut().zip(&vector.0) {
                *acc += v;
            }
            count += 1;
        }

        let n = count as f64;
        Some(FactorVector(sum.into_iter().map(|v| v / n).collect()))
    }
}
