//! # Cosine similarity between rows of sparse matrices
//!
//! Prepares the inputs of the product engine so that dot products become
//! cosine scores:
//!
//! 1. **Normalisation**: rows of `A` are scaled to unit L2 norm
//! 2. **Right operand**:
//!    - without `B`, a transposed clone of normalised `A` is used and the
//!      product is pruned to its strict upper triangle (self-similarity)
//!    - with `B` (shape `k × m`, one vector per column), `B` is transposed,
//!      its rows normalised and transposed back, so the vectors are
//!      normalised while `B` keeps the orientation the product needs
//! 3. **Product**: [`crate::engine::SimilarityEngine`] with the lower bound and top-N
//!
//! The free functions mutate their arguments in place. [`CosineSimilarityBuilder`]
//! works on clones and leaves the inputs untouched.
//!
//! # Examples
//!
//! ```
//! use sparsesim::cosine::CosineSimilarityBuilder;
//! use sparsesim::matrix::CsrMatrix;
//!
//! let names = CsrMatrix::from_dense_rows(&[
//!     vec![1.0, 2.0, 3.0],
//!     vec![1.0, 2.0, 3.0],
//!     vec![1.0, 2.0, 4.0],
//! ])
//! .unwrap();
//!
//! let set = CosineSimilarityBuilder::new()
//!     .with_lower_bound(0.5)
//!     .compute(&names, None)
//!     .unwrap();
//!
//! assert_eq!(set.len(), 2);
//! assert!(set.get(2).is_none());
//! ```

use crate::cancel::CancelToken;
use crate::engine::{EngineParams, SimilarityEngine};
use crate::error::{Result, SimilarityError};
use crate::matrix::CsrMatrix;
use crate::normalise::normalise_rows;
use crate::similarity::SimilaritySet;

use log::{debug, info, trace};

/// Cosine similarity of the rows of `a` against the columns of `b`, or of
/// `a` against itself when `b` is `None`.
///
/// Only scores strictly above `lower_bound` are returned, at most `top_n`
/// per row (`0` returns every score above the bound). Self-similarity
/// reports each unordered pair once, as `(i, j)` with `i < j`.
///
/// `a` and `b` are normalised in place; clone them first if the raw values
/// are needed afterwards.
///
/// # Errors
///
/// * [`SimilarityError::InvalidInput`] if `a` is `None`
/// * [`SimilarityError::DimensionMismatch`] if `a.cols() != b.rows()`
pub fn cosine_similarity(
    a: Option<&mut CsrMatrix>,
    b: Option<&mut CsrMatrix>,
    lower_bound: f64,
    top_n: usize,
) -> Result<SimilaritySet> {
    cosine_similarity_with_cancel(a, b, lower_bound, top_n, &CancelToken::new())
}

/// [`cosine_similarity`] that can be interrupted through `cancel`.
///
/// # Errors
///
/// As [`cosine_similarity`], plus [`SimilarityError::Cancelled`].
pub fn cosine_similarity_with_cancel(
    a: Option<&mut CsrMatrix>,
    b: Option<&mut CsrMatrix>,
    lower_bound: f64,
    top_n: usize,
    cancel: &CancelToken,
) -> Result<SimilaritySet> {
    let params = EngineParams { lower_bound, top_n, ..EngineParams::default() };
    run_cosine(a, b, params, cancel)
}

fn run_cosine(
    a: Option<&mut CsrMatrix>,
    b: Option<&mut CsrMatrix>,
    mut params: EngineParams,
    cancel: &CancelToken,
) -> Result<SimilaritySet> {
    let a = a.ok_or_else(|| SimilarityError::InvalidInput("first matrix is required".to_string()))?;

    if let Some(b) = b.as_deref() {
        if a.cols() != b.rows() {
            return Err(SimilarityError::DimensionMismatch {
                left_cols: a.cols(),
                right_rows: b.rows(),
            });
        }
    }

    info!(
        "Cosine similarity for {} rows with {} features ({})",
        a.rows(),
        a.cols(),
        if b.is_some() { "against second matrix" } else { "self-similarity" }
    );
    debug!("lower_bound={}, top_n={}", params.lower_bound, params.top_n);

    normalise_rows(a);

    let result = match b {
        None => {
            trace!("Cloning normalised matrix as right operand");
            let right = a.transposed();
            params.diagonal_only = true;
            SimilarityEngine::new(params).run(a, &right, cancel)
        }
        Some(b) => {
            trace!("Normalising the {} column vectors of the right operand", b.cols());
            b.transpose();
            normalise_rows(b);
            b.transpose();
            params.diagonal_only = false;
            SimilarityEngine::new(params).run(a, b, cancel)
        }
    };

    if let Ok(set) = &result {
        info!("Cosine similarity found {} pairs in {} rows", set.nnz(), set.len());
    }
    result
}

/// Configures and runs a cosine similarity computation without touching the
/// caller's matrices.
#[derive(Debug, Clone)]
pub struct CosineSimilarityBuilder {
    lower_bound: f64,
    top_n: usize,
    parallel: bool,
    cancel: CancelToken,
}

impl Default for CosineSimilarityBuilder {
    fn default() -> Self {
        debug!("Creating CosineSimilarityBuilder with default parameters");
        Self {
            lower_bound: 0.0,
            top_n: 0,
            parallel: false,
            cancel: CancelToken::new(),
        }
    }
}

impl CosineSimilarityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive threshold on the cosine score.
    pub fn with_lower_bound(mut self, lower_bound: f64) -> Self {
        debug!("Setting lower bound: {}", lower_bound);
        self.lower_bound = lower_bound;
        self
    }

    /// Keep at most `top_n` matches per row; `0` keeps every match above the bound.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        debug!("Setting top_n: {}", top_n);
        self.top_n = top_n;
        self
    }

    /// Spread rows over the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        debug!("Setting parallel: {}", parallel);
        self.parallel = parallel;
        self
    }

    /// Token polled once per row; signal it to abort the computation.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Compute cosine similarity of `a` against `b` (or against itself).
    ///
    /// # Errors
    ///
    /// [`SimilarityError::DimensionMismatch`] or [`SimilarityError::Cancelled`].
    pub fn compute(&self, a: &CsrMatrix, b: Option<&CsrMatrix>) -> Result<SimilaritySet> {
        let mut a = a.clone();
        let mut b = b.cloned();
        let params = EngineParams {
            diagonal_only: false,
            lower_bound: self.lower_bound,
            top_n: self.top_n,
            parallel: self.parallel,
        };
        run_cosine(Some(&mut a), b.as_mut(), params, &self.cancel)
    }
}
