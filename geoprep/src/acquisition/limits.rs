//! Pool-wide request pacing and per-destination serialization.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::cancel::CancelFlag;

/// Enforces a minimum spacing between request starts across all workers.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next request slot.
    ///
    /// The first caller proceeds immediately. Returns `false` if the wait was
    /// cut short by cancellation.
    pub fn acquire(&self, cancel: &CancelFlag) -> bool {
        let wait = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let start = match *next {
                Some(slot) if slot > now => slot,
                _ => now,
            };
            *next = Some(start + self.interval);
            start - now
        };

        if wait.is_zero() {
            !cancel.is_cancelled()
        } else {
            cancel.sleep(wait)
        }
    }
}

/// One lock per destination path.
///
/// At most one fetch may write a given path at a time.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock guarding `path`.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }

    /// Number of distinct paths seen.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
