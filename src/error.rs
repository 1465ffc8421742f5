//! Error types for sparse similarity computation.

use thiserror::Error;

/// Errors surfaced by matrix construction, the product engine and the cosine pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimilarityError {
    /// A required input was not provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Left operand columns do not match right operand rows.
    #[error("Dimension mismatch: left matrix has {left_cols} columns, right matrix has {right_rows} rows")]
    DimensionMismatch {
        left_cols: usize,
        right_rows: usize,
    },

    /// CSR arrays violate the storage invariants.
    #[error("Malformed matrix: {0}")]
    MalformedMatrix(String),

    /// The cancellation token was signalled before the computation finished.
    #[error("Computation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SimilarityError>;
