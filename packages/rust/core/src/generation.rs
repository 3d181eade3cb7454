//! Operation fencing for overlapping async calls.
//!
//! Each operation type owns a [`Generation`]. Starting an operation issues a
//! new token; when the remote call resolves, the result may only touch shared
//! state if its token is still the latest one issued.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic token source for one kind of operation.
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new operation, superseding all earlier ones.
    pub fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `token` is still the latest issued.
    pub fn is_current(&self, token: u64) -> bool {
        self.0.load(Ordering::SeqCst) == token
    }

    /// Supersede any operation in flight without starting a new one.
    pub fn invalidate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
