use std::sync::atomic::{AtomicU64, Ordering};

/// Hashes performed by every worker in a run.
///
/// Each completed hash/verify pair adds 2, so the value is always even and
/// half of it is the number of completed pairs.
#[derive(Debug, Default)]
pub struct HashCounter {
    value: AtomicU64,
}

impl HashCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one hash plus one verify.
    pub fn add_pair(&self) {
        self.value.fetch_add(2, Ordering::Relaxed);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn completed_pairs(&self) -> u64 {
        self.get() / 2
    }
}
