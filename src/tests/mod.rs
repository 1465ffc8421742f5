
mod test_matrix;
