//! # Compressed sparse row storage
//!
//! `CsrMatrix` is the storage the similarity pipeline works on: per-row start
//! offsets into two parallel arrays of column indices and values.
//!
//! Storage invariants, checked by every constructor:
//! - `row_start.len() == rows + 1`, `row_start[0] == 0`, non-decreasing
//! - `row_start[rows] == nnz == col_index.len() == value.len()`
//! - every column index is `< cols`, at most once per row
//!
//! The storage itself is a `sprs::CsMat<f64>` in CSR layout. Column indices
//! handed to [`CsrMatrix::try_new`] may come in any order inside a row; they
//! are sorted on construction, so every row has strictly ascending columns.
//! Explicit zeros are kept.
//!
//! Normalisation and transposition work in place: callers that need the
//! original content afterwards must clone first (or use
//! [`CsrMatrix::transposed`] / [`crate::normalise::normalised`]).
//!
//! # Examples
//!
//! ```
//! use sparsesim::matrix::CsrMatrix;
//!
//! // [[1, 0, 2],
//! //  [0, 3, 0]]
//! let mut m = CsrMatrix::try_new(2, 3, vec![0, 2, 3], vec![0, 2, 1], vec![1.0, 2.0, 3.0]).unwrap();
//! assert_eq!(m.get(0, 2), 2.0);
//!
//! m.transpose();
//! assert_eq!(m.shape(), (3, 2));
//! assert_eq!(m.get(2, 0), 2.0);
//! ```

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use sprs::{CsMat, TriMat};

use crate::error::{Result, SimilarityError};

use log::{debug, trace};

/// Sparse matrix in compressed-row form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CsrParts", into = "CsrParts")]
pub struct CsrMatrix {
    inner: CsMat<f64>,
}

/// Raw interchange form of a [`CsrMatrix`], as passed across a binding layer.
///
/// Deserialising a `CsrMatrix` goes through this struct so that the storage
/// invariants are validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CsrParts {
    pub rows: usize,
    pub cols: usize,
    pub row_start: Vec<usize>,
    pub col_index: Vec<usize>,
    pub value: Vec<f64>,
}

impl TryFrom<CsrParts> for CsrMatrix {
    type Error = SimilarityError;

    fn try_from(parts: CsrParts) -> Result<Self> {
        CsrMatrix::try_new(parts.rows, parts.cols, parts.row_start, parts.col_index, parts.value)
    }
}

impl From<CsrMatrix> for CsrParts {
    fn from(m: CsrMatrix) -> Self {
        let (rows, cols, row_start, col_index, value) = m.into_raw_parts();
        CsrParts { rows, cols, row_start, col_index, value }
    }
}

impl CsrMatrix {
    /// Build from raw CSR arrays, validating the storage invariants.
    ///
    /// # Errors
    ///
    /// [`SimilarityError::MalformedMatrix`] when the arrays are inconsistent:
    /// wrong pointer length, non-zero first pointer, decreasing pointers,
    /// last pointer different from the number of entries, index/value length
    /// mismatch, a column index out of range or repeated within a row.
    pub fn try_new(
        rows: usize,
        cols: usize,
        row_start: Vec<usize>,
        col_index: Vec<usize>,
        value: Vec<f64>,
    ) -> Result<Self> {
        // sprs sorts each row by these offsets before its own checks
        check_offsets(rows, &row_start, &col_index, &value)?;
        let inner = CsMat::new_from_unsorted((rows, cols), row_start, col_index, value)
            .map_err(|(_, _, _, e)| SimilarityError::MalformedMatrix(format!("{:?}", e)))?;
        trace!("Validated {}x{} CSR matrix with {} entries", rows, cols, inner.nnz());
        Ok(Self { inner })
    }

    /// An all-zero matrix with no stored entries.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { inner: CsMat::zero((rows, cols)) }
    }

    /// Build from `(row, col, value)` triplets in any order.
    /// Duplicate coordinates are summed; each output row has ascending columns.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Result<Self> {
        if let Some(&(r, c, _)) = triplets.iter().find(|&&(r, c, _)| r >= rows || c >= cols) {
            return Err(SimilarityError::MalformedMatrix(format!(
                "triplet ({}, {}) outside a {}x{} matrix",
                r, c, rows, cols
            )));
        }
        let mut tri = TriMat::with_capacity((rows, cols), triplets.len());
        for &(r, c, v) in triplets {
            tri.add_triplet(r, c, v);
        }
        Ok(Self { inner: tri.to_csr() })
    }

    /// Build from dense row vectors, storing only non-zero values.
    /// All rows must have the same length.
    pub fn from_dense_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut tri = TriMat::new((rows.len(), n_cols));

        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(SimilarityError::MalformedMatrix(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    tri.add_triplet(i, j, v);
                }
            }
        }

        Ok(Self { inner: tri.to_csr() })
    }

    /// Build from a smartcore dense matrix, storing only non-zero values.
    pub fn from_dense(dense: &DenseMatrix<f64>) -> Self {
        let (rows, cols) = dense.shape();
        let mut tri = TriMat::new((rows, cols));

        for i in 0..rows {
            for j in 0..cols {
                let v = *dense.get((i, j));
                if v != 0.0 {
                    tri.add_triplet(i, j, v);
                }
            }
        }

        debug!("Converted dense {}x{} matrix into {} sparse entries", rows, cols, tri.nnz());
        Self { inner: tri.to_csr() }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.inner.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.inner.cols()
    }

    /// `(rows, cols)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    /// Number of stored entries, explicit zeros included.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    /// The underlying `sprs` matrix, always in CSR layout.
    pub fn as_csmat(&self) -> &CsMat<f64> {
        &self.inner
    }

    pub fn col_index(&self) -> &[usize] {
        self.inner.indices()
    }

    pub fn values(&self) -> &[f64] {
        self.inner.data()
    }

    /// Column indices and values stored for row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let range = self.inner.indptr().outer_inds_sz(i);
        (&self.inner.indices()[range.clone()], &self.inner.data()[range])
    }

    /// Mutable values of row `i`; the sparsity pattern stays fixed.
    #[inline]
    pub fn row_values_mut(&mut self, i: usize) -> &mut [f64] {
        let range = self.inner.indptr().outer_inds_sz(i);
        &mut self.inner.data_mut()[range]
    }

    /// Iterate `(column, value)` pairs of row `i` in ascending column order.
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (cols, vals) = self.row(i);
        cols.iter().copied().zip(vals.iter().copied())
    }

    /// Value at `(i, j)`, `0.0` when nothing is stored there.
    ///
    /// # Panics
    ///
    /// If `i` or `j` is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.rows() && j < self.cols(),
            "Index out of bounds: ({}, {}) for {}x{} matrix",
            i,
            j,
            self.rows(),
            self.cols()
        );
        self.inner.get(i, j).copied().unwrap_or(0.0)
    }

    /// Replace the content with its transpose.
    pub fn transpose(&mut self) {
        *self = self.transposed();
    }

    /// Transposed copy in CSR layout.
    pub fn transposed(&self) -> Self {
        trace!(
            "Transposing {}x{} matrix with {} entries",
            self.rows(),
            self.cols(),
            self.nnz()
        );
        Self { inner: self.inner.transpose_view().to_csr() }
    }

    /// Give back the interchange arrays `(rows, cols, row_start, col_index, value)`.
    pub fn into_raw_parts(self) -> (usize, usize, Vec<usize>, Vec<usize>, Vec<f64>) {
        let (rows, cols) = self.inner.shape();
        let (row_start, col_index, value) = self.inner.into_raw_storage();
        (rows, cols, row_start, col_index, value)
    }

    /// Dense row-major copy. Intended for small matrices and inspection.
    pub fn to_dense_rows(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.cols()]; self.rows()];
        for (i, row) in dense.iter_mut().enumerate() {
            for (j, v) in self.row_iter(i) {
                row[j] = v;
            }
        }
        dense
    }

    /// Owned copy of the underlying `sprs` CSR matrix.
    pub fn to_csmat(&self) -> CsMat<f64> {
        self.inner.clone()
    }
}

impl From<&CsMat<f64>> for CsrMatrix {
    /// Accepts both CSR and CSC storage from `sprs`.
    fn from(m: &CsMat<f64>) -> Self {
        let inner = if m.is_csr() { m.clone() } else { m.to_csr() };
        Self { inner }
    }
}

/// Offsets must be well formed before sprs slices rows with them.
fn check_offsets(rows: usize, row_start: &[usize], col_index: &[usize], value: &[f64]) -> Result<()> {
    let malformed = |msg: String| -> Result<()> { Err(SimilarityError::MalformedMatrix(msg)) };

    if row_start.len() != rows + 1 {
        return malformed(format!(
            "row_start has length {}, expected {}",
            row_start.len(),
            rows + 1
        ));
    }
    if row_start[0] != 0 {
        return malformed(format!("row_start[0] is {}, expected 0", row_start[0]));
    }
    if let Some(i) = row_start.windows(2).position(|w| w[1] < w[0]) {
        return malformed(format!(
            "row_start decreases at row {} ({} -> {})",
            i,
            row_start[i],
            row_start[i + 1]
        ));
    }
    if col_index.len() != value.len() {
        return malformed(format!(
            "col_index has {} entries but value has {}",
            col_index.len(),
            value.len()
        ));
    }
    if row_start[rows] != col_index.len() {
        return malformed(format!(
            "row_start[{}] is {}, expected {} stored entries",
            rows,
            row_start[rows],
            col_index.len()
        ));
    }
    Ok(())
}
