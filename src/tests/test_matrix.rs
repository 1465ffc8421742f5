use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::SimilarityError;
use crate::matrix::{CsrMatrix, CsrParts};
use crate::tests::test_helpers::*;

fn is_malformed(r: Result<CsrMatrix, SimilarityError>) -> bool {
    matches!(r, Err(SimilarityError::MalformedMatrix(_)))
}

#[test]
fn test_try_new_accepts_unsorted_columns() {
    let m = csr(2, 3, &[0, 2, 3], &[2, 0, 1], &[5.0, 1.0, 3.0]);

    assert_eq!(m.shape(), (2, 3));
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.get(0, 0), 1.0);
    assert_eq!(m.get(0, 2), 5.0);
    assert_eq!(m.get(1, 1), 3.0);
    assert_eq!(m.get(1, 0), 0.0);
    // columns are sorted on construction
    assert_eq!(m.row(0).0, &[0usize, 2]);
    assert_eq!(m.row(0).1, &[1.0, 5.0]);
}

#[test]
fn test_try_new_rejects_malformed_storage() {
    // wrong pointer length
    assert!(is_malformed(CsrMatrix::try_new(2, 2, vec![0, 1], vec![0], vec![1.0])));
    // first pointer not zero
    assert!(is_malformed(CsrMatrix::try_new(1, 2, vec![1, 1], vec![0], vec![1.0])));
    // decreasing pointers
    assert!(is_malformed(CsrMatrix::try_new(2, 2, vec![0, 2, 1], vec![0, 1], vec![1.0, 1.0])));
    // last pointer does not match stored entries
    assert!(is_malformed(CsrMatrix::try_new(1, 2, vec![0, 1], vec![0, 1], vec![1.0, 1.0])));
    // index / value length mismatch
    assert!(is_malformed(CsrMatrix::try_new(1, 2, vec![0, 2], vec![0, 1], vec![1.0])));
    // column out of range
    assert!(is_malformed(CsrMatrix::try_new(1, 2, vec![0, 1], vec![2], vec![1.0])));
    // column out of range inside an unsorted row
    assert!(is_malformed(CsrMatrix::try_new(1, 3, vec![0, 2], vec![5, 0], vec![1.0, 1.0])));
}

#[test]
fn test_zero_sized_matrices() {
    let m = CsrMatrix::try_new(0, 0, vec![0], vec![], vec![]).unwrap();
    assert_eq!(m.shape(), (0, 0));
    assert_eq!(m.transposed().shape(), (0, 0));

    let z = CsrMatrix::zeros(3, 4);
    assert_eq!(z.nnz(), 0);
    assert_eq!(z.transposed().shape(), (4, 3));
}

#[test]
fn test_transpose_in_place() {
    let mut m = right_3x2();
    m.transpose();

    assert_eq!(m.shape(), (2, 3));
    assert_eq!(m.nnz(), 6);
    assert_eq!(m.to_dense_rows(), vec![vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]]);
}

#[test]
fn test_transpose_twice_restores_values() {
    let m = csr(3, 4, &[0, 2, 2, 5], &[3, 1, 0, 2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let back = m.transposed().transposed();

    assert_eq!(back.shape(), m.shape());
    assert_eq!(back.to_dense_rows(), m.to_dense_rows());
    // columns come out sorted
    assert_eq!(back.row(0).0, &[1usize, 3]);
    assert_eq!(back.row(1).0, &[] as &[usize]);
}

#[test]
fn test_from_triplets_sums_duplicates() {
    let m = CsrMatrix::from_triplets(2, 3, &[(1, 2, 1.0), (0, 1, 2.0), (1, 2, 0.5), (1, 0, 3.0)]).unwrap();

    assert_eq!(m.nnz(), 3);
    assert_eq!(m.col_index(), &[1usize, 0, 2]);
    assert_eq!(m.values(), &[2.0, 3.0, 1.5]);

    let (_, _, row_start, _, _) = m.into_raw_parts();
    assert_eq!(row_start, vec![0usize, 1, 3]);
}

#[test]
fn test_transpose_matches_sprs_transpose() {
    let m = csr(3, 4, &[0, 2, 2, 5], &[3, 1, 0, 2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0]);
    let t = m.transposed();

    let expected = m.as_csmat().transpose_view().to_csr();
    assert_eq!(t.as_csmat(), &expected);
    assert!(t.as_csmat().is_csr());
    assert_eq!(t.to_dense_rows()[3], vec![1.0, 0.0, 5.0]);
}

#[test]
fn test_storage_is_sprs_csr() {
    let m = csr(2, 3, &[0, 2, 3], &[2, 0, 1], &[5.0, 1.0, 3.0]);
    let cs = m.as_csmat();

    assert!(cs.is_csr());
    assert_eq!(cs.shape(), (2, 3));
    assert_eq!(cs.indices(), &[0usize, 2, 1]);
    assert_eq!(cs.data(), &[1.0, 5.0, 3.0]);
    assert_eq!(cs.get(0, 2), Some(&5.0));
}

#[test]
fn test_from_triplets_out_of_range() {
    assert!(is_malformed(CsrMatrix::from_triplets(2, 2, &[(2, 0, 1.0)])));
    assert!(is_malformed(CsrMatrix::from_triplets(2, 2, &[(0, 5, 1.0)])));
}

#[test]
fn test_from_dense_rows() {
    let m = CsrMatrix::from_dense_rows(&[vec![0.0, 1.5, 0.0], vec![2.0, 0.0, 3.0]]).unwrap();
    assert_eq!(m.shape(), (2, 3));
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.get(1, 2), 3.0);

    assert!(is_malformed(CsrMatrix::from_dense_rows(&[vec![1.0, 2.0], vec![1.0]])));
}

#[test]
fn test_from_smartcore_dense() {
    let dense = DenseMatrix::from_2d_vec(&vec![vec![1.0, 0.0, 2.0], vec![0.0, 0.0, 3.0]]).unwrap();
    let m = CsrMatrix::from_dense(&dense);

    assert_eq!(m.shape(), (2, 3));
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.to_dense_rows(), vec![vec![1.0, 0.0, 2.0], vec![0.0, 0.0, 3.0]]);
}

#[test]
fn test_sprs_interop() {
    let m = csr(2, 3, &[0, 2, 3], &[2, 0, 1], &[5.0, 1.0, 3.0]);
    let cs = m.to_csmat();

    assert_eq!(cs.shape(), (2, 3));
    assert_eq!(cs.nnz(), 3);
    assert_eq!(cs.get(0, 2), Some(&5.0));

    let back = CsrMatrix::from(&cs);
    assert_eq!(back.to_dense_rows(), m.to_dense_rows());

    let from_csc = CsrMatrix::from(&cs.to_csc());
    assert_eq!(from_csc.to_dense_rows(), m.to_dense_rows());
}

#[test]
fn test_raw_parts_roundtrip() {
    let m = left_2x3();
    let parts = CsrParts::from(m.clone());
    assert_eq!(CsrMatrix::try_from(parts).unwrap(), m);

    let (rows, cols, row_start, col_index, value) = m.into_raw_parts();
    assert_eq!((rows, cols), (2, 3));
    assert_eq!(row_start, vec![0usize, 3, 6]);
    assert_eq!(col_index.len(), value.len());

    let bad = CsrParts { rows: 1, cols: 1, row_start: vec![0, 1], col_index: vec![3], value: vec![1.0] };
    assert!(is_malformed(CsrMatrix::try_from(bad)));
}

#[test]
#[should_panic(expected = "Index out of bounds")]
fn test_get_out_of_bounds_panics() {
    left_2x3().get(2, 0);
}
