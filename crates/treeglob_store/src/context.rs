//! Request scoped accounting of object fetches.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Counters shared by every fetch issued on behalf of one request.
///
/// A context is passed by reference through a whole request so concurrent
/// branches of the same request all account into the same counters.
#[derive(Debug, Default)]
pub struct FetchContext {
    trees: AtomicU64,
    blobs: AtomicU64,
    cache_hits: AtomicU64,
}

/// A point in time copy of the counters of a [`FetchContext`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    /// Number of trees served by a backing store.
    pub trees: u64,
    /// Number of blobs served by a backing store.
    pub blobs: u64,
    /// Number of objects served from a cache tier.
    pub cache_hits: u64,
}

impl FetchContext {
    /// Creates a context with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a tree was read from a backing store.
    pub fn record_tree_fetch(&self) {
        self.trees.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that a blob was read from a backing store.
    pub fn record_blob_fetch(&self) {
        self.blobs.fetch_add(1, Ordering::Relaxed);
    }

    /// Records that an object was served from a cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the current value of the counters.
    pub fn stats(&self) -> FetchStats {
        FetchStats {
            trees: self.trees.load(Ordering::Relaxed),
            blobs: self.blobs.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// A simple start/stop stopwatch for measuring request latency.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimer {
    started: Instant,
    stopped: Option<Instant>,
}

impl RequestTimer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            stopped: None,
        }
    }

    /// Stops the timer and returns the elapsed time. Stopping twice keeps the
    /// first stop time.
    pub fn stop(&mut self) -> Duration {
        let stopped = *self.stopped.get_or_insert_with(Instant::now);
        stopped.duration_since(self.started)
    }

    /// Time elapsed since the start, up to the stop time if stopped.
    pub fn elapsed(&self) -> Duration {
        self.stopped
            .unwrap_or_else(Instant::now)
            .duration_since(self.started)
    }
}
