//! Mangled frame accounting

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MangledState {
    count: AtomicU64,
    seen: AtomicBool,
}

/// Shared count of frames rejected as malformed.
///
/// Clones share the same counter. The count only ever goes up.
#[derive(Debug, Clone, Default)]
pub struct MangledCounter {
    inner: Arc<MangledState>,
}

impl MangledCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one mangled frame, returning the new total
    pub fn record(&self) -> u64 {
        self.inner.seen.store(true, Ordering::Relaxed);
        self.inner.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Relaxed)
    }

    /// Whether any mangled frame has been seen
    pub fn is_mangled(&self) -> bool {
        self.inner.seen.load(Ordering::Relaxed)
    }
}
