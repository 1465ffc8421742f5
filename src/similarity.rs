//! Result types of a similarity computation.
//!
//! A [`SimilaritySet`] is itself sparse over row index: only rows with at
//! least one qualifying entry are stored, in ascending row order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};

/// One entry of a result row: the matched column and its score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityValue {
    pub column: usize,
    pub score: f64,
}

impl SimilarityValue {
    pub fn new(column: usize, score: f64) -> Self {
        Self { column, score }
    }
}

/// Descending score, ties by ascending column.
#[inline]
pub(crate) fn by_score_desc(a: &SimilarityValue, b: &SimilarityValue) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.column.cmp(&b.column))
}

/// Qualifying entries found for one source row.
///
/// With a top-N limit `values` is sorted by descending score. Without one the
/// order follows the accumulator's discovery order (most recently discovered
/// column first) and is not sorted by score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub index: usize,
    pub values: Vec<SimilarityValue>,
}

impl SimilarityRow {
    pub fn new(index: usize, values: Vec<SimilarityValue>) -> Self {
        Self { index, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Score stored for `column`, if any.
    pub fn score(&self, column: usize) -> Option<f64> {
        self.values.iter().find(|v| v.column == column).map(|v| v.score)
    }

    /// Sort values by descending score, ties by ascending column.
    pub fn sort_by_score(&mut self) {
        self.values.sort_unstable_by(by_score_desc);
    }

    /// Highest-scoring entry.
    pub fn best(&self) -> Option<&SimilarityValue> {
        self.values.iter().min_by(|a, b| by_score_desc(a, b))
    }
}

/// Sparse collection of result rows, ordered by row index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilaritySet {
    rows: Vec<SimilarityRow>,
}

impl SimilaritySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. Empty rows are dropped so the set stays sparse.
    ///
    /// # Panics
    ///
    /// If `row.index` does not exceed the index of the last stored row.
    pub(crate) fn push(&mut self, row: SimilarityRow) {
        if row.is_empty() {
            return;
        }
        if let Some(last) = self.rows.last() {
            assert!(
                row.index > last.index,
                "rows must be pushed in ascending index order: {} after {}",
                row.index,
                last.index
            );
        }
        self.rows.push(row);
    }

    /// Number of non-empty rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of stored entries across all rows.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SimilarityRow::len).sum()
    }

    pub fn rows(&self) -> &[SimilarityRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimilarityRow> {
        self.rows.iter()
    }

    /// Row for source index `index`, `None` when it had no qualifying entry.
    pub fn get(&self, index: usize) -> Option<&SimilarityRow> {
        self.rows
            .binary_search_by_key(&index, |r| r.index)
            .ok()
            .map(|pos| &self.rows[pos])
    }

    /// Score for the pair `(row, column)`, if it was returned.
    pub fn score(&self, row: usize, column: usize) -> Option<f64> {
        self.get(row).and_then(|r| r.score(column))
    }

    /// Flatten into `(row, column, score)` triplets.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter().map(move |v| (r.index, v.column, v.score)))
    }

    /// Sort the values of every row by descending score.
    pub fn sort_rows_by_score(&mut self) {
        self.rows.iter_mut().for_each(SimilarityRow::sort_by_score);
    }

    /// Export as a `sprs` CSR matrix of the given `(rows, cols)` shape.
    pub fn to_csmat(&self, shape: (usize, usize)) -> CsMat<f64> {
        let mut triplets = TriMat::new(shape);
        for (i, j, s) in self.pairs() {
            triplets.add_triplet(i, j, s);
        }
        triplets.to_csr()
    }
}

impl From<Vec<SimilarityRow>> for SimilaritySet {
    /// Rows are sorted by index; empty rows are dropped.
    fn from(mut rows: Vec<SimilarityRow>) -> Self {
        rows.retain(|r| !r.is_empty());
        rows.sort_by_key(|r| r.index);
        Self { rows }
    }
}

impl IntoIterator for SimilaritySet {
    type Item = SimilarityRow;
    type IntoIter = std::vec::IntoIter<SimilarityRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a SimilaritySet {
    type Item = &'a SimilarityRow;
    type IntoIter = std::slice::Iter<'a, SimilarityRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
