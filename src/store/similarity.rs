use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::EntityId,
};

/// Dense, precomputed cosine similarity between entities of one kind
///
/// Values are stored row-major in the order of `ids`.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    ids: Vec<EntityId>,
    index: HashMap<EntityId, usize>,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Builds a matrix from its column ids and one `(row id, values)` pair per id
    ///
    /// Rows may arrive in any order but must cover the column ids exactly.
    pub fn from_rows(ids: Vec<EntityId>, rows: Vec<(EntityId, Vec<f64>)>) -> AppResult<Self> {
        let n = ids.len();
        let mut index = HashMap::with_capacity(n);
        for (position, id) in ids.iter().enumerate() {
            if index.insert(*id, position).is_some() {
                return Err(AppError::MalformedData(format!(
                    "duplicate column id {} in similarity matrix",
                    id
                )));
            }
        }

        if rows.len() != n {
            return Err(AppError::MalformedData(format!(
                "similarity matrix has {} rows for {} columns",
                rows.len(),
                n
            )));
        }

        let mut values = vec![0.0; n * n];
        let mut seen = vec![false; n];

        for (id, row) in rows {
            let position = *index.get(&id).ok_or_else(|| {
                AppError::MalformedData(format!("similarity row {} has no matching column", id))
            })?;
            if std::mem::replace(&mut seen[position], true) {
                return Err(AppError::MalformedData(format!(
                    "duplicate row id {} in similarity matrix",
                    id
                )));
            }
            if row.len() != n {
                return Err(AppError::MalformedData(format!(
                    "similarity row {} has {} values, expected {}",
                    id,
                    row.len(),
                    n
                )));
            }
            if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
                return Err(AppError::MalformedData(format!(
                    "similarity row {} contains non-finite value {}",
                    id, bad
                )));
            }
            values[position * n..(position + 1) * n].copy_from_slice(&row);
        }

        Ok(Self { ids, index, values })
    }

    /// Reads a square matrix as written by `DataFrame.to_csv()`
    ///
    /// The first header cell is the index label and is ignored; the remaining
    /// header cells are column ids. Each row is `id, value, value, ...`.
    pub fn from_reader<R: Read>(reader: R) -> AppResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);

        let ids = csv_reader
            .headers()?
            .iter()
            .skip(1)
            .map(parse_id)
            .collect::<AppResult<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(ids.len());
        for record in csv_reader.records() {
            let record = record?;
            let mut cells = record.iter();
            let id = parse_id(cells.next().unwrap_or_default())?;
            let row = cells
                .map(|cell| {
                    cell.trim().parse::<f64>().map_err(|e| {
                        AppError::MalformedData(format!(
                            "similarity row {}: '{}' is not a number: {}",
                            id, cell, e
                        ))
                    })
                })
                .collect::<AppResult<Vec<_>>>()?;
            rows.push((id, row));
        }

        Self::from_rows(ids, rows)
    }

    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let matrix = Self::from_reader(file)?;

        let off_diagonal = matrix
            .ids
            .iter()
            .filter(|id| matrix.get(**id, **id).map_or(true, |s| (s - 1.0).abs() > 1e-6))
            .count();
        if off_diagonal > 0 {
            tracing::warn!(
                path = %path.as_ref().display(),
                entries = off_diagonal,
                "Similarity matrix diagonal is not 1"
            );
        }

        tracing::info!(
            path = %path.as_ref().display(),
            entities = matrix.len(),
            "Loaded similarity matrix"
        );

        Ok(matrix)
    }

    pub fn get(&self, a: EntityId, b: EntityId) -> Option<f64> {
        let row = *self.index.get(&a)?;
        let col = *self.index.get(&b)?;
        Some(self.values[row * self.ids.len() + col])
    }

    /// Similarity of every entity in the matrix to `id`, read down its column
    pub fn similarities_to(
        &self,
        id: EntityId,
    ) -> Option<impl Iterator<Item = (EntityId, f64)> + '_> {
        let col = *self.index.get(&id)?;
        let n = self.ids.len();
        Some(
            self.ids
                .iter()
                .enumerate()
                .map(move |(row, other)| (*other, self.values[row * n + col])),
        )
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Ids may be written as `7` or, by pandas, as `7.0`
fn parse_id(cell: &str) -> AppResult<EntityId> {
    let cell = cell.trim();
    if let Ok(id) = cell.parse::<EntityId>() {
        return Ok(id);
    }
    match cell.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value.fract() == 0.0
                && (EntityId::MIN as f64..EntityId::MAX as f64).contains(&value) =>
        {
            Ok(value as EntityId)
        }
        _ => Err(AppError::MalformedData(format!(
            "'{}' is not a valid entity id",
            cell
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATRIX: &str = ",1,2,3\n\
                          1,1.0,0.2,1.0\n\
                          2,0.2,1.0,-0.5\n\
                          3,1.0,-0.5,1.0\n";

    #[test]
    fn test_from_reader() {
        let matrix = SimilarityMatrix::from_reader(MATRIX.as_bytes()).unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.get(1, 2), Some(0.2));
        assert_eq!(matrix.get(2, 3), Some(-0.5));
        assert_eq!(matrix.get(1, 4), None);
        assert!(matrix.contains(3));
    }

    #[test]
    fn test_similarities_to_reads_column() {
        let matrix = SimilarityMatrix::from_rows(
            vec![1, 2],
            vec![(1, vec![1.0, 0.9]), (2, vec![0.1, 1.0])],
        )
        .unwrap();

        let column: Vec<_> = matrix.similarities_to(1).unwrap().collect();
        assert_eq!(column, vec![(1, 1.0), (2, 0.1)]);
        assert!(matrix.similarities_to(9).is_none());
    }

    #[test]
    fn test_rows_in_any_order() {
        let matrix = SimilarityMatrix::from_rows(
            vec![10, 20],
            vec![(20, vec![0.3, 1.0]), (10, vec![1.0, 0.3])],
        )
        .unwrap();
        assert_eq!(matrix.get(20, 10), Some(0.3));
        assert_eq!(matrix.get(10, 10), Some(1.0));
    }

    #[test]
    fn test_pandas_float_ids() {
        let data = "id,1.0,2.0\n1.0,1.0,0.5\n2.0,0.5,1.0\n";
        let matrix = SimilarityMatrix::from_reader(data.as_bytes()).unwrap();
        assert_eq!(matrix.get(1, 2), Some(0.5));
    }

    #[test]
    fn test_out_of_range_id_rejected() {
        assert!(matches!(parse_id("1e30"), Err(AppError::MalformedData(_))));
        assert!(matches!(parse_id("-1e30"), Err(AppError::MalformedData(_))));
        assert!(matches!(parse_id("1.5"), Err(AppError::MalformedData(_))));
        assert!(matches!(
            parse_id("9223372036854775808.0"),
            Err(AppError::MalformedData(_))
        ));
        assert_eq!(parse_id("-9223372036854775808").unwrap(), EntityId::MIN);

        let data = ",1,1e30\n1,1.0,0.5\n1e30,0.5,1.0\n";
        let result = SimilarityMatrix::from_reader(data.as_bytes());
        assert!(matches!(result, Err(AppError::MalformedData(msg)) if msg.contains("1e30")));
    }

    #[test]
    fn test_non_square_rejected() {
        let result =
            SimilarityMatrix::from_rows(vec![1, 2], vec![(1, vec![1.0, 0.5])]);
        assert!(matches!(result, Err(AppError::MalformedData(_))));
    }

    #[test]
    fn test_unknown_row_rejected() {
        let result = SimilarityMatrix::from_rows(
            vec![1, 2],
            vec![(1, vec![1.0, 0.5]), (3, vec![0.5, 1.0])],
        );
        assert!(matches!(result, Err(AppError::MalformedData(msg)) if msg.contains("row 3")));
    }

    #[test]
    fn test_bad_value_rejected() {
        let data = ",1,2\n1,1.0,abc\n2,0.5,1.0\n";
        let result = SimilarityMatrix::from_reader(data.as_bytes());
        assert!(matches!(result, Err(AppError::MalformedData(_))));
    }
}
