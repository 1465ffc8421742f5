//! # sparsesim
//!
//! Top-N cosine similarity between the rows of large, high-dimensional,
//! mostly-zero matrices, e.g. character n-gram vectors used for fuzzy
//! matching of names at scale.
//!
//! Instead of a dense all-pairs comparison, the rows are L2-normalised and
//! multiplied as sparse matrices. Each output row is accumulated in a reusable
//! sparse accumulator and only the entries above a threshold, optionally the
//! N largest, are kept.
//!
//! Modules:
//! - [`matrix`]: validated CSR storage, transpose, interop with `sprs` and `smartcore`
//! - [`normalise`]: row L2 normalisation
//! - [`accumulator`]: per-row sparse accumulator
//! - [`engine`]: thresholded top-N sparse product
//! - [`cosine`]: cosine similarity pipeline and builder
//! - [`similarity`]: result types
//! - [`cancel`]: cooperative cancellation
//!
//! ```
//! use sparsesim::{cosine_similarity, CsrMatrix};
//!
//! let mut a = CsrMatrix::from_dense_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
//! let mut b = CsrMatrix::from_dense_rows(&[vec![4.0, 7.0], vec![5.0, 8.0], vec![6.0, 9.0]]).unwrap();
//!
//! let set = cosine_similarity(Some(&mut a), Some(&mut b), 0.98, 0).unwrap();
//! assert_eq!(set.len(), 1);
//! assert!(set.score(1, 0).unwrap() > 0.999);
//! ```

pub mod accumulator;
pub mod cancel;
pub mod cosine;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod normalise;
pub mod similarity;

pub use cancel::CancelToken;
pub use cosine::{cosine_similarity, cosine_similarity_with_cancel, CosineSimilarityBuilder};
pub use engine::{sparse_dot_product, EngineParams, SimilarityEngine};
pub use error::{Result, SimilarityError};
pub use matrix::{CsrMatrix, CsrParts};
pub use normalise::{normalise_rows, normalised};
pub use similarity::{SimilarityRow, SimilaritySet, SimilarityValue};

#[cfg(test)]
mod tests;
