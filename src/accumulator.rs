//! Sparse accumulator for one output row of a sparse product.
//!
//! A dense `sums` buffer sized to the output dimension plus a stack of the
//! indices touched in the current row. Draining walks only the touched
//! indices and resets them, so the buffers are reused across rows at
//! O(touched) cost instead of O(dimension).

/// Scratch buffers for one worker. Never share one between concurrent rows.
#[derive(Debug, Clone)]
pub struct SparseAccumulator {
    sums: Vec<f64>,
    touched: Vec<bool>,
    visited: Vec<usize>,
}

impl SparseAccumulator {
    pub fn new(dim: usize) -> Self {
        Self {
            sums: vec![0.0; dim],
            touched: vec![false; dim],
            visited: Vec::new(),
        }
    }

    /// Output dimension the buffers are sized to.
    pub fn dim(&self) -> usize {
        self.sums.len()
    }

    /// Add `value` at index `k`, recording `k` on its first touch this row.
    #[inline]
    pub fn add(&mut self, k: usize, value: f64) {
        self.sums[k] += value;
        if !self.touched[k] {
            self.touched[k] = true;
            self.visited.push(k);
        }
    }

    /// Number of distinct indices touched since the last drain.
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    /// Hand every touched `(index, sum)` to `f`, most recently discovered
    /// first, and reset the touched slots.
    pub fn drain<F: FnMut(usize, f64)>(&mut self, mut f: F) {
        while let Some(k) = self.visited.pop() {
            f(k, self.sums[k]);
            self.sums[k] = 0.0;
            self.touched[k] = false;
        }
    }
}
