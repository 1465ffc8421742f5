//! Cooperative cancellation shared between a caller and a running computation.
//!
//! The engine polls the token once per outer row, so a row that has started
//! always completes; the call as a whole then aborts with
//! [`SimilarityError::Cancelled`](crate::error::SimilarityError::Cancelled).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

/// Clonable cancellation flag. All clones observe the same signal.
///
/// ```
/// use sparsesim::cancel::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every holder of this token.
    pub fn cancel(&self) {
        debug!("Cancellation requested");
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
