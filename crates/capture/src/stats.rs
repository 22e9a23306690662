use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the acquisition loop.
#[derive(Debug, Default)]
pub struct CaptureStats {
    published: AtomicU64,
    acquire_failures: AtomicU64,
    decode_failures: AtomicU64,
}

/// Point-in-time copy of [`CaptureStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub published: u64,
    pub acquire_failures: u64,
    pub decode_failures: u64,
}

impl StatsSnapshot {
    pub fn dropped(&self) -> u64 {
        self.acquire_failures + self.decode_failures
    }
}

impl CaptureStats {
    /// Returns the new published count.
    pub(crate) fn record_published(&self) -> u64 {
        self.published.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_acquire_failure(&self) -> u64 {
        self.acquire_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_decode_failure(&self) -> u64 {
        self.decode_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            acquire_failures: self.acquire_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }
}
