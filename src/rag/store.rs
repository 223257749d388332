//! Flat vector index
//!
//! A dense row-major matrix with exhaustive squared-L2 search. Rows are
//! append-only; `clear` via re-allocation keeps the dimensionality.

use anyhow::{bail, Result};

pub struct VectorIndex {
    dimension: usize,
    // row-major, len == rows * dimension
    data: Vec<f32>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed vectors
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append one vector, returning its row id.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dimension {
            bail!(
                "vector dimension {} does not match index dimension {}",
                vector.len(),
                self.dimension
            );
        }
        let row = self.len();
        self.data.extend_from_slice(vector);
        Ok(row)
    }

    fn row(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// The `k` nearest rows by squared L2 distance, ascending. Ties break
    /// on row id so repeated searches return identical orderings. `k` is
    /// clamped to the row count; an empty index yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let rows = self.len();
        if rows == 0 || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = (0..rows)
            .map(|i| {
                let dist = self
                    .row(i)
                    .iter()
                    .zip(query)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f32>();
                (i, dist)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k.min(rows));
        scored
    }

    /// All rows as owned vectors, for persistence.
    pub fn rows(&self) -> Vec<Vec<f32>> {
        (0..self.len()).map(|i| self.row(i).to_vec()).collect()
    }

    /// Rebuild an index from persisted rows.
    pub fn from_rows(dimension: usize, rows: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = Self::new(dimension);
        for row in rows {
            index.add(&row)?;
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_orders_by_distance_with_stable_ties() {
        let mut index = VectorIndex::new(2);
        index.add(&[0.0, 0.0]).unwrap();
        index.add(&[1.0, 0.0]).unwrap();
        index.add(&[1.0, 0.0]).unwrap(); // duplicate of row 1

        let hits = index.search(&[1.0, 0.0], 3);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 2);
        assert_eq!(hits[2].0, 0);
        assert!(hits[0].1 < hits[2].1);
    }

    #[test]
    fn k_is_clamped_and_empty_index_is_fine() {
        let index = VectorIndex::new(4);
        assert!(index.search(&[0.0; 4], 10).is_empty());

        let mut index = VectorIndex::new(4);
        index.add(&[0.0; 4]).unwrap();
        assert_eq!(index.search(&[0.0; 4], 10).len(), 1);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = VectorIndex::new(3);
        assert!(index.add(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn rows_round_trip() {
        let mut index = VectorIndex::new(2);
        index.add(&[1.0, 2.0]).unwrap();
        index.add(&[3.0, 4.0]).unwrap();

        let rebuilt = VectorIndex::from_rows(2, index.rows()).unwrap();
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.rows(), index.rows());
    }
}
