//! Fetch strategies for batch acquisition.
//!
//! This module implements the Strategy pattern for sequential vs parallel
//! fetching of a target list. Both strategies record results by target
//! position and stop picking up new work once cancellation is requested.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use super::limits::{PathLocks, RateLimiter};
use super::state::AcquisitionState;
use super::{AcquisitionEvent, EventCallback};
use crate::cancel::CancelFlag;
use crate::fetch::{FetchOptions, FetchResult, FetchTarget, Fetcher, ProgressCallback};

/// Everything a strategy needs besides the targets.
pub struct RunContext<'a> {
    pub fetcher: &'a Fetcher,
    pub options: &'a FetchOptions,
    pub cancel: &'a CancelFlag,
    pub on_event: Option<&'a EventCallback<'a>>,
}

impl RunContext<'_> {
    fn emit(&self, event: AcquisitionEvent) {
        if let Some(cb) = self.on_event {
            cb(&event);
        }
    }
}

/// Strategy for fetching a list of targets.
pub trait FetchStrategy: Send + Sync {
    /// Fetch `targets`, recording each result in `state` at its position.
    fn execute(&self, targets: &[FetchTarget], ctx: &RunContext<'_>, state: &mut AcquisitionState);
}

/// Fetch one target, emitting start/progress/finish events.
fn fetch_one(index: usize, target: &FetchTarget, ctx: &RunContext<'_>) -> FetchResult {
    ctx.emit(AcquisitionEvent::Started {
        index,
        id: target.id.clone(),
    });

    let result = match ctx.on_event {
        Some(cb) => {
            let progress: &ProgressCallback<'_> = &move |downloaded: u64, total: u64| {
                cb(&AcquisitionEvent::Bytes {
                    index,
                    downloaded,
                    total,
                });
            };
            ctx.fetcher
                .fetch_with_progress(target, ctx.options, Some(progress))
        }
        None => ctx.fetcher.fetch(target, ctx.options),
    };

    ctx.emit(AcquisitionEvent::Finished {
        index,
        result: result.clone(),
    });

    result
}

/// Sequential fetch strategy.
///
/// Fetches targets one at a time and pauses for `delay` between consecutive
/// network requests. Targets that are skipped make no request and incur no
/// pause, and there is never a pause after the final request.
#[derive(Debug, Default)]
pub struct SequentialStrategy {
    pub delay: Duration,
}

impl SequentialStrategy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl FetchStrategy for SequentialStrategy {
    fn execute(&self, targets: &[FetchTarget], ctx: &RunContext<'_>, state: &mut AcquisitionState) {
        let mut requested = false;

        for (index, target) in targets.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                break;
            }

            let needs_request = !ctx.fetcher.would_skip(target, ctx.options);

            if needs_request && requested && !self.delay.is_zero() {
                ctx.emit(AcquisitionEvent::Waiting { delay: self.delay });
                if !ctx.cancel.sleep(self.delay) {
                    break;
                }
            }

            let result = fetch_one(index, target, ctx);
            requested |= needs_request;
            state.record(index, result);
        }
    }
}

/// Parallel fetch strategy.
///
/// A fixed pool of workers pulls targets from a shared cursor. Request
/// starts are spaced by `min_interval` across the whole pool, and a
/// destination path is written by at most one worker at a time.
#[derive(Debug)]
pub struct ParallelStrategy {
    /// Number of worker threads.
    pub workers: usize,
    /// Minimum spacing between request starts across all workers.
    pub min_interval: Duration,
}

impl ParallelStrategy {
    /// Create a new parallel strategy.
    ///
    /// # Arguments
    ///
    /// * `workers` - Number of concurrent fetches (minimum 1)
    /// * `min_interval` - Pool-wide spacing between request starts
    pub fn new(workers: usize, min_interval: Duration) -> Self {
        Self {
            workers: workers.max(1),
            min_interval,
        }
    }
}

impl Default for ParallelStrategy {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1))
    }
}

impl FetchStrategy for ParallelStrategy {
    fn execute(&self, targets: &[FetchTarget], ctx: &RunContext<'_>, state: &mut AcquisitionState) {
        if targets.is_empty() {
            return;
        }

        let limiter = RateLimiter::new(self.min_interval);
        let locks = PathLocks::new();
        let cursor = AtomicUsize::new(0);
        let shared = Mutex::new(state);
        let workers = self.workers.min(targets.len());

        debug!(workers, targets = targets.len(), "Starting fetch workers");

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if ctx.cancel.is_cancelled() {
                        break;
                    }

                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(target) = targets.get(index) else {
                        break;
                    };

                    let lock = locks.lock_for(&target.destination);
                    let _guard = lock.lock();

                    if !ctx.fetcher.would_skip(target, ctx.options) && !limiter.acquire(ctx.cancel)
                    {
                        break;
                    }

                    let result = fetch_one(index, target, ctx);
                    shared.lock().record(index, result);
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_strategy_new() {
        let strategy = SequentialStrategy::new(Duration::from_millis(500));
        assert_eq!(strategy.delay, Duration::from_millis(500));
    }

    #[test]
    fn test_parallel_strategy_new() {
        let strategy = ParallelStrategy::new(8, Duration::from_secs(2));
        assert_eq!(strategy.workers, 8);
        assert_eq!(strategy.min_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_parallel_strategy_min_workers() {
        let strategy = ParallelStrategy::new(0, Duration::ZERO);
        assert_eq!(strategy.workers, 1);
    }

    #[test]
    fn test_parallel_strategy_default() {
        let strategy = ParallelStrategy::default();
        assert_eq!(strategy.workers, 4);
        assert_eq!(strategy.min_interval, Duration::from_secs(1));
    }
}
