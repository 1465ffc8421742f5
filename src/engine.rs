//! # Thresholded top-N sparse matrix product
//!
//! Computes `C = A · B` one row at a time (Gustavson's row-wise scheme) and
//! keeps, for every row of `C`, only the entries strictly above a lower bound,
//! optionally truncated to the `top_n` largest.
//!
//! ## Algorithm
//!
//! For row `i` of `A`:
//! 1. For every stored `(j, v)` of `A[i]` and every stored `(k, w)` of `B[j]`,
//!    add `v * w` into a [`SparseAccumulator`] at `k`. With `diagonal_only`
//!    set, columns `k <= i` are skipped: when `B` is the transpose of `A` the
//!    product is symmetric and only the strict upper triangle carries
//!    information.
//! 2. Drain the accumulator; entries with `sum > lower_bound` qualify.
//! 3. With `top_n > 0`, select the `top_n` largest with a partial selection
//!    and order them by descending score (ties by ascending column).
//! 4. Rows without qualifying entries are left out of the result.
//!
//! The cancellation token is polled before each row; a signalled token aborts
//! the whole call with [`SimilarityError::Cancelled`].
//!
//! ## Complexity
//!
//! * **Accumulation**: `O(Σ_i Σ_{j ∈ A[i]} nnz(B[j]))`
//! * **Selection**: `O(visited_i + top_n log top_n)` per row
//! * **Memory**: `O(m)` scratch per worker, `m = B.cols()`
//!
//! ## Parallelism
//!
//! Rows of `A` are independent given read-only `A` and `B`. With
//! `EngineParams::parallel` rows are spread over the rayon pool and every
//! worker owns its private accumulator. The output is identical to the
//! sequential run.

use rayon::prelude::*;

use crate::accumulator::SparseAccumulator;
use crate::cancel::CancelToken;
use crate::error::{Result, SimilarityError};
use crate::matrix::CsrMatrix;
use crate::similarity::{by_score_desc, SimilarityRow, SimilaritySet, SimilarityValue};

use log::{debug, info, trace, warn};

#[derive(Debug, Clone)]
pub struct EngineParams {
    /// Skip output columns `k <= i` (self-similarity pruning).
    pub diagonal_only: bool,
    /// Exclusive threshold: only scores `> lower_bound` are kept.
    pub lower_bound: f64,
    /// Maximum entries per row, `0` keeps everything above the bound.
    pub top_n: usize,
    /// Process rows on the rayon pool.
    pub parallel: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            diagonal_only: false,
            lower_bound: 0.0,
            top_n: 0,
            parallel: false,
        }
    }
}

// Approximate equality on the float threshold, exact on the rest
impl PartialEq for EngineParams {
    fn eq(&self, other: &Self) -> bool {
        self.diagonal_only == other.diagonal_only
            && self.top_n == other.top_n
            && self.parallel == other.parallel
            && approx::relative_eq!(self.lower_bound, other.lower_bound)
    }
}

/// Row-wise sparse product with threshold and top-N selection.
pub struct SimilarityEngine {
    params: EngineParams,
}

impl SimilarityEngine {
    pub fn new(params: EngineParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Run the product `a · b`.
    ///
    /// # Errors
    ///
    /// * [`SimilarityError::DimensionMismatch`] if `a.cols() != b.rows()`
    /// * [`SimilarityError::Cancelled`] if `cancel` is signalled before the
    ///   last row starts; no partial result is returned
    pub fn run(&self, a: &CsrMatrix, b: &CsrMatrix, cancel: &CancelToken) -> Result<SimilaritySet> {
        if a.cols() != b.rows() {
            return Err(SimilarityError::DimensionMismatch {
                left_cols: a.cols(),
                right_rows: b.rows(),
            });
        }

        let (n_rows, n_cols) = (a.rows(), b.cols());
        info!(
            "Sparse product {}x{} · {}x{} (nnz {} and {})",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols(),
            a.nnz(),
            b.nnz()
        );
        debug!("Engine parameters: {:?}", self.params);

        let result = if self.params.parallel {
            self.run_parallel(a, b, cancel)
        } else {
            self.run_sequential(a, b, cancel)
        };

        match &result {
            Ok(set) => info!(
                "Product finished: {} of {} rows with {} entries over {} columns",
                set.len(),
                n_rows,
                set.nnz(),
                n_cols
            ),
            Err(SimilarityError::Cancelled) => warn!("Sparse product cancelled"),
            Err(e) => debug!("Sparse product failed: {}", e),
        }
        result
    }

    fn run_sequential(&self, a: &CsrMatrix, b: &CsrMatrix, cancel: &CancelToken) -> Result<SimilaritySet> {
        let mut acc = SparseAccumulator::new(b.cols());
        let mut candidates: Vec<SimilarityValue> = Vec::new();
        let mut set = SimilaritySet::new();

        for i in 0..a.rows() {
            if cancel.is_cancelled() {
                trace!("Cancellation observed before row {}", i);
                return Err(SimilarityError::Cancelled);
            }
            if let Some(row) = self.compute_row(i, a, b, &mut acc, &mut candidates) {
                set.push(row);
            }
        }
        Ok(set)
    }

    fn run_parallel(&self, a: &CsrMatrix, b: &CsrMatrix, cancel: &CancelToken) -> Result<SimilaritySet> {
        let rows: Vec<Option<SimilarityRow>> = (0..a.rows())
            .into_par_iter()
            .map_init(
                || (SparseAccumulator::new(b.cols()), Vec::new()),
                |(acc, candidates), i| {
                    if cancel.is_cancelled() {
                        trace!("Cancellation observed before row {}", i);
                        return Err(SimilarityError::Cancelled);
                    }
                    Ok(self.compute_row(i, a, b, acc, candidates))
                },
            )
            .collect::<Result<Vec<_>>>()?;

        let mut set = SimilaritySet::new();
        rows.into_iter().flatten().for_each(|row| set.push(row));
        Ok(set)
    }

    /// Accumulate, threshold and select row `i`; `None` when nothing qualifies.
    /// `candidates` is scratch reused between rows.
    fn compute_row(
        &self,
        i: usize,
        a: &CsrMatrix,
        b: &CsrMatrix,
        acc: &mut SparseAccumulator,
        candidates: &mut Vec<SimilarityValue>,
    ) -> Option<SimilarityRow> {
        let EngineParams { diagonal_only, lower_bound, top_n, .. } = self.params;

        let (a_indptr, a_indices, a_data) = (a.as_csmat().indptr(), a.col_index(), a.values());
        let (b_indptr, b_indices, b_data) = (b.as_csmat().indptr(), b.col_index(), b.values());

        for a_idx in a_indptr.outer_inds_sz(i) {
            let (j, v) = (a_indices[a_idx], a_data[a_idx]);
            for b_idx in b_indptr.outer_inds_sz(j) {
                let k = b_indices[b_idx];
                if diagonal_only && k <= i {
                    continue;
                }
                acc.add(k, v * b_data[b_idx]);
            }
        }

        let visited = acc.visited_len();
        let mut values: Vec<SimilarityValue> = Vec::new();
        let sink = if top_n > 0 { &mut *candidates } else { &mut values };
        acc.drain(|k, sum| {
            if sum > lower_bound {
                sink.push(SimilarityValue::new(k, sum));
            }
        });

        if top_n > 0 {
            select_top_n(candidates, top_n);
            values.extend(candidates.drain(..));
        }

        if i % 1000 == 0 {
            trace!("Row {}: {} columns visited, {} kept", i, visited, values.len());
        }

        if values.is_empty() {
            None
        } else {
            Some(SimilarityRow::new(i, values))
        }
    }
}

/// Keep the `n` highest-scoring candidates, ordered by descending score.
/// Equal scores are ordered by ascending column, so the choice among ties
/// at the cut is deterministic.
pub(crate) fn select_top_n(candidates: &mut Vec<SimilarityValue>, n: usize) {
    if n == 0 {
        candidates.clear();
        return;
    }
    if candidates.len() > n {
        candidates.select_nth_unstable_by(n - 1, by_score_desc);
        candidates.truncate(n);
    }
    candidates.sort_unstable_by(by_score_desc);
}

/// Row-wise product of `a` and `b` keeping entries above `lower_bound`,
/// at most `top_n` per row (`0` for all of them).
///
/// `diagonal_only` drops every output column `k <= i`; use it when `b` is the
/// transpose of `a` so each unordered pair is reported once and self-pairs
/// are skipped.
///
/// ```
/// use sparsesim::cancel::CancelToken;
/// use sparsesim::engine::sparse_dot_product;
/// use sparsesim::matrix::CsrMatrix;
///
/// let a = CsrMatrix::from_dense_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
/// let b = CsrMatrix::from_dense_rows(&[vec![4.0, 7.0], vec![5.0, 8.0], vec![6.0, 9.0]]).unwrap();
///
/// let set = sparse_dot_product(&a, &b, false, 0.0, 1, &CancelToken::new()).unwrap();
/// assert_eq!(set.score(0, 1), Some(50.0));
/// assert_eq!(set.score(1, 1), Some(122.0));
/// assert_eq!(set.nnz(), 2);
/// ```
pub fn sparse_dot_product(
    a: &CsrMatrix,
    b: &CsrMatrix,
    diagonal_only: bool,
    lower_bound: f64,
    top_n: usize,
    cancel: &CancelToken,
) -> Result<SimilaritySet> {
    SimilarityEngine::new(EngineParams {
        diagonal_only,
        lower_bound,
        top_n,
        parallel: false,
    })
    .run(a, b, cancel)
}
