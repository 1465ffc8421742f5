//! Row-wise L2 normalisation of CSR matrices.
//!
//! Once every row has unit norm, the dot product of two rows is their cosine
//! similarity, which is what lets the product engine compute cosine scores.

use crate::matrix::CsrMatrix;

use log::{debug, trace};

/// Scale every row of `matrix` to unit L2 norm, in place.
///
/// Rows whose sum of squares is exactly zero are left untouched.
///
/// ```
/// use sparsesim::matrix::CsrMatrix;
/// use sparsesim::normalise::normalise_rows;
///
/// let mut m = CsrMatrix::from_dense_rows(&[vec![3.0, 4.0], vec![0.0, 0.0]]).unwrap();
/// normalise_rows(&mut m);
/// assert_eq!(m.get(0, 0), 0.6);
/// assert_eq!(m.get(0, 1), 0.8);
/// assert_eq!(m.nnz(), 2);
/// ```
pub fn normalise_rows(matrix: &mut CsrMatrix) {
    debug!(
        "Normalising {} rows ({} stored entries) to unit norm",
        matrix.rows(),
        matrix.nnz()
    );
    let norms = row_norms(matrix);
    let mut skipped = 0usize;
    for (i, &norm) in norms.iter().enumerate() {
        if norm == 0.0 {
            skipped += 1;
            continue;
        }
        matrix.row_values_mut(i).iter_mut().for_each(|x| *x /= norm);
    }

    let (min, max) = norms
        .iter()
        .filter(|&&n| n > 0.0)
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), &n| (lo.min(n), hi.max(n)));
    if max > 0.0 {
        debug!("Row norms before scaling: min {:.4}, max {:.4}", min, max);
    }
    trace!("Left {} zero rows untouched", skipped);
}

/// Normalised copy of `matrix`; the input is not modified.
pub fn normalised(matrix: &CsrMatrix) -> CsrMatrix {
    let mut out = matrix.clone();
    normalise_rows(&mut out);
    out
}

/// L2 norm of every row, from the sum of squares of its stored values.
pub fn row_norms(matrix: &CsrMatrix) -> Vec<f64> {
    let indptr = matrix.as_csmat().indptr();
    let data = matrix.values();
    (0..matrix.rows())
        .map(|i| {
            indptr
                .outer_inds_sz(i)
                .map(|idx| data[idx] * data[idx])
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}
