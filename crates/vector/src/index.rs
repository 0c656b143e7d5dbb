use matjip_common::{MatjipError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Tolerance used when checking that stored rows are unit length
const UNIT_NORM_TOLERANCE: f32 = 1e-3;

/// Scale `v` to unit L2 norm; `None` for zero or non-finite vectors
pub fn normalize(v: ArrayView1<f32>) -> Option<Array1<f32>> {
    if v.iter().any(|x| !x.is_finite()) {
        return None;
    }

    let norm = v.dot(&v).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }

    Some(&v / norm)
}

/// Stack encoder rows into a matrix, rejecting ragged input
pub fn stack_rows(rows: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let count = rows.len();
    let dimension = rows.first().map_or(0, Vec::len);

    let mut flat = Vec::with_capacity(count * dimension);
    for (position, row) in rows.into_iter().enumerate() {
        if row.len() != dimension {
            return Err(MatjipError::DimensionMismatch {
                what: format!("embedding row {}", position),
                expected: dimension,
                found: row.len(),
            });
        }
        flat.extend(row);
    }

    Array2::from_shape_vec((count, dimension), flat)
        .map_err(|e| MatjipError::encoding(format!("Failed to shape embedding matrix: {}", e)))
}

/// Exhaustive inner-product index over unit-normalized rows
///
/// Row `i` always belongs to restaurant `i` of the catalog holding the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIpIndex {
    vectors: Array2<f32>,
}

impl FlatIpIndex {
    /// Normalize every row of `raw` and index the result in row order
    pub fn build(raw: &Array2<f32>) -> Result<Self> {
        let mut vectors = Array2::zeros(raw.raw_dim());

        for (position, (row, mut out)) in raw
            .axis_iter(Axis(0))
            .zip(vectors.axis_iter_mut(Axis(0)))
            .enumerate()
        {
            let unit = normalize(row).ok_or_else(|| {
                MatjipError::encoding(format!(
                    "Embedding row {} has zero or non-finite norm",
                    position
                ))
            })?;
            out.assign(&unit);
        }

        Ok(Self { vectors })
    }

    /// Number of indexed vectors
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension (0 for an empty index)
    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Index of the first row that is not unit length, if any
    pub fn first_non_unit_row(&self) -> Option<usize> {
        self.vectors
            .axis_iter(Axis(0))
            .position(|row| (row.dot(&row).sqrt() - 1.0).abs() > UNIT_NORM_TOLERANCE)
    }

    /// Top-k rows by inner product with a unit query
    ///
    /// Descending score, ties in row order. Returns fewer than `k` hits when the
    /// index is smaller than `k`.
    pub fn search(&self, query: ArrayView1<f32>, k: usize) -> Result<Vec<(usize, f32)>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension() {
            return Err(MatjipError::DimensionMismatch {
                what: "query".to_string(),
                expected: self.dimension(),
                found: query.len(),
            });
        }

        let scores = self.vectors.dot(&query);
        let mut hits: Vec<(usize, f32)> = scores
            .iter()
            .enumerate()
            // Rounding can push unit dot products just past 1
            .map(|(i, &score)| (i, score.clamp(-1.0, 1.0)))
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.truncate(k);

        Ok(hits)
    }
}

impl Default for FlatIpIndex {
    fn default() -> Self {
        Self {
            vectors: Array2::zeros((0, 0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_normalize() {
        let unit = normalize(array![3.0f32, 4.0].view()).unwrap();
        assert!((unit[0] - 0.6).abs() < 1e-6);
        assert!((unit[1] - 0.8).abs() < 1e-6);

        assert!(normalize(array![0.0f32, 0.0].view()).is_none());
        assert!(normalize(array![f32::NAN, 1.0].view()).is_none());
        assert!(normalize(array![f32::INFINITY, 1.0].view()).is_none());
    }

    #[test]
    fn test_stack_rows_rejects_ragged_input() {
        let matrix = stack_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(matrix.dim(), (2, 2));

        let err = stack_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0]]).unwrap_err();
        match err {
            MatjipError::DimensionMismatch { what, expected, found } => {
                assert_eq!(what, "embedding row 2");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_normalizes_rows() {
        let raw = array![[3.0f32, 4.0], [0.0, 10.0]];
        let index = FlatIpIndex::build(&raw).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.first_non_unit_row(), None);
    }

    #[test]
    fn test_build_rejects_zero_row() {
        let raw = array![[1.0f32, 0.0], [0.0, 0.0]];
        assert!(matches!(
            FlatIpIndex::build(&raw),
            Err(MatjipError::Encoding(_))
        ));
    }

    #[test]
    fn test_search_orders_by_score_then_position() {
        let raw = array![[0.0f32, 1.0], [1.0, 0.0], [1.0, 1.0], [2.0, 0.0]];
        let index = FlatIpIndex::build(&raw).unwrap();

        let hits = index.search(array![1.0f32, 0.0].view(), 10).unwrap();
        let order: Vec<usize> = hits.iter().map(|(i, _)| *i).collect();

        // Rows 1 and 3 tie at 1.0 and keep row order
        assert_eq!(order, vec![1, 3, 2, 0]);
        assert!(hits.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(hits.iter().all(|(_, s)| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_search_truncates_to_k() {
        let raw = array![[1.0f32, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let index = FlatIpIndex::build(&raw).unwrap();

        assert_eq!(index.search(array![1.0f32, 0.0].view(), 1).unwrap().len(), 1);
        assert_eq!(index.search(array![1.0f32, 0.0].view(), 5).unwrap().len(), 3);
    }

    #[test]
    fn test_search_empty_index() {
        let index = FlatIpIndex::build(&Array2::zeros((0, 0))).unwrap();
        assert!(index.is_empty());
        assert!(index.search(array![1.0f32].view(), 3).unwrap().is_empty());
    }

    #[test]
    fn test_search_rejects_wrong_query_dimension() {
        let index = FlatIpIndex::build(&array![[1.0f32, 0.0]]).unwrap();
        assert!(matches!(
            index.search(array![1.0f32, 0.0, 0.0].view(), 1),
            Err(MatjipError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_first_non_unit_row() {
        let index = FlatIpIndex {
            vectors: array![[1.0f32, 0.0], [0.5, 0.5]],
        };
        assert_eq!(index.first_non_unit_row(), Some(1));
    }
}
