//! Batch acquisition of tiles and datasets.
//!
//! This module drives the [`Fetcher`](crate::fetch::Fetcher) over a list of
//! targets:
//! - Plan mode: counts existing vs pending targets and estimates the bytes
//!   still to download, without touching the network (`plan`)
//! - Execute mode: fetches every target, tolerating individual failures
//!   (`execute`)
//! - Scoped retry of only the failed subset (`retry_failed`)
//!
//! # Architecture
//!
//! ```text
//! AcquisitionOrchestrator
//!         │
//!         ├── FetchStrategy (trait)
//!         │       ├── SequentialStrategy (pause between requests)
//!         │       └── ParallelStrategy (worker pool, rate limit, path locks)
//!         │
//!         ├── Fetcher (single target)
//!         │
//!         └── AcquisitionState → AcquisitionSummary
//! ```
//!
//! # Example
//!
//! ```ignore
//! use geoprep::acquisition::{AcquisitionConfig, AcquisitionOrchestrator};
//! use geoprep::fetch::{FetchTarget, Fetcher};
//!
//! let orchestrator = AcquisitionOrchestrator::new(Fetcher::http()?, AcquisitionConfig::default());
//! let targets: Vec<FetchTarget> = grid.tiles().iter().map(FetchTarget::from).collect();
//!
//! let plan = orchestrator.plan(&targets);
//! println!("{} to download (~{} bytes)", plan.pending(), plan.estimated_bytes);
//!
//! let summary = orchestrator.execute(&targets, None);
//! println!("failed: {:?}", summary.failed_ids());
//! ```

mod limits;
mod sources;
mod state;
mod strategy;

pub use limits::{PathLocks, RateLimiter};
pub use sources::{boundary_targets, BoundaryDataset, NATURAL_EARTH_DATASETS};
pub use state::{AcquisitionState, AcquisitionSummary};
pub use strategy::{FetchStrategy, ParallelStrategy, RunContext, SequentialStrategy};

use std::time::Duration;

use tracing::{info, warn};

use crate::cancel::CancelFlag;
use crate::fetch::{FetchOptions, FetchOutcome, FetchResult, FetchTarget, Fetcher};

/// Default pause between consecutive requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Default size estimate for one elevation tile archive (150 MB).
pub const DEFAULT_ESTIMATED_ITEM_BYTES: u64 = 150 * 1024 * 1024;

/// Progress notifications emitted during a run.
///
/// `index` is the position of the target in the list passed to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionEvent {
    /// A target is about to be fetched.
    Started { index: usize, id: String },
    /// Bytes received for a target so far (`total` is 0 when unknown).
    Bytes {
        index: usize,
        downloaded: u64,
        total: u64,
    },
    /// A target reached its terminal result.
    Finished { index: usize, result: FetchResult },
    /// The sequential strategy is pausing before the next request.
    Waiting { delay: Duration },
}

/// Callback receiving acquisition events; may be called from worker threads.
pub type EventCallback<'a> = dyn Fn(&AcquisitionEvent) + Send + Sync + 'a;

/// Which failures a retry should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryScope {
    /// Only transport/status/I-O failures; not-found targets are left alone.
    Errors,
    /// Every failure, including not-found.
    AllFailures,
}

impl RetryScope {
    fn includes(&self, outcome: &FetchOutcome) -> bool {
        match self {
            Self::Errors => matches!(outcome, FetchOutcome::FailedError { .. }),
            Self::AllFailures => outcome.is_failure(),
        }
    }
}

/// Configuration for batch acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Options applied to every fetch.
    pub options: FetchOptions,
    /// Pause between consecutive requests (pool-wide spacing when parallel).
    pub request_delay: Duration,
    /// Number of concurrent fetches; 1 selects the sequential strategy.
    pub parallel: usize,
    /// Size estimate per pending target, for plans.
    pub estimated_item_bytes: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            options: FetchOptions::default(),
            request_delay: DEFAULT_REQUEST_DELAY,
            parallel: 1,
            estimated_item_bytes: DEFAULT_ESTIMATED_ITEM_BYTES,
        }
    }
}

impl AcquisitionConfig {
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set the number of concurrent fetches (minimum 1).
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    pub fn with_estimated_item_bytes(mut self, bytes: u64) -> Self {
        self.estimated_item_bytes = bytes;
        self
    }
}

/// Cost estimate for a batch, computed without network access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionPlan {
    /// Number of targets in the batch.
    pub total: usize,
    /// Targets already present on disk.
    pub existing: usize,
    /// Identifiers of targets still to download, in target order.
    pub pending_ids: Vec<String>,
    /// Estimated bytes still to download.
    pub estimated_bytes: u64,
}

impl AcquisitionPlan {
    /// Number of targets still to download.
    pub fn pending(&self) -> usize {
        self.pending_ids.len()
    }

    /// Check whether there is nothing to download.
    pub fn is_empty(&self) -> bool {
        self.pending_ids.is_empty()
    }
}

/// Drives fetches over a target list.
#[derive(Debug, Clone)]
pub struct AcquisitionOrchestrator {
    fetcher: Fetcher,
    config: AcquisitionConfig,
    cancel: CancelFlag,
}

impl AcquisitionOrchestrator {
    pub fn new(fetcher: Fetcher, config: AcquisitionConfig) -> Self {
        Self {
            fetcher,
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Use an externally owned cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Enumerate pending work without fetching anything.
    pub fn plan(&self, targets: &[FetchTarget]) -> AcquisitionPlan {
        let pending_ids: Vec<String> = targets
            .iter()
            .filter(|t| !self.fetcher.would_skip(t, &self.config.options))
            .map(|t| t.id.clone())
            .collect();

        AcquisitionPlan {
            total: targets.len(),
            existing: targets.len() - pending_ids.len(),
            estimated_bytes: pending_ids.len() as u64 * self.config.estimated_item_bytes,
            pending_ids,
        }
    }

    /// Fetch every target and summarize the run.
    ///
    /// Individual failures never stop the batch. Cancellation stops picking
    /// up new targets; those are listed in `not_attempted`.
    pub fn execute(
        &self,
        targets: &[FetchTarget],
        on_event: Option<&EventCallback<'_>>,
    ) -> AcquisitionSummary {
        info!(
            targets = targets.len(),
            parallel = self.config.parallel,
            "Starting acquisition"
        );

        let mut state = AcquisitionState::new(targets);
        let ctx = RunContext {
            fetcher: &self.fetcher,
            options: &self.config.options,
            cancel: &self.cancel,
            on_event,
        };

        // Choose strategy based on parallel setting
        if self.config.parallel <= 1 {
            let strategy = SequentialStrategy::new(self.config.request_delay);
            strategy.execute(targets, &ctx, &mut state);
        } else {
            let strategy = ParallelStrategy::new(self.config.parallel, self.config.request_delay);
            strategy.execute(targets, &ctx, &mut state);
        }

        let summary = state.into_summary(self.cancel.is_cancelled());

        if summary.cancelled {
            warn!(
                not_attempted = summary.not_attempted.len(),
                "Acquisition cancelled"
            );
        }
        info!(
            downloaded = summary.downloaded(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            bytes = summary.bytes(),
            "Acquisition finished"
        );

        summary
    }

    /// Run again over exactly the failed subset of a previous run.
    pub fn retry_failed(
        &self,
        previous: &AcquisitionSummary,
        targets: &[FetchTarget],
        scope: RetryScope,
        on_event: Option<&EventCallback<'_>>,
    ) -> AcquisitionSummary {
        let failed: Vec<&str> = previous
            .results
            .iter()
            .filter(|r| scope.includes(&r.outcome))
            .map(|r| r.id.as_str())
            .collect();

        let subset: Vec<FetchTarget> = targets
            .iter()
            .filter(|t| failed.contains(&t.id.as_str()))
            .cloned()
            .collect();

        info!(targets = subset.len(), "Retrying failed targets");
        self.execute(&subset, on_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.request_delay, Duration::from_secs(1));
        assert_eq!(config.parallel, 1);
        assert_eq!(config.estimated_item_bytes, 150 * 1024 * 1024);
        assert!(config.options.skip_if_exists);
    }

    #[test]
    fn test_parallel_minimum() {
        let config = AcquisitionConfig::default().with_parallel(0);
        assert_eq!(config.parallel, 1);
    }

    #[test]
    fn test_retry_scope() {
        let error = FetchOutcome::FailedError {
            reason: "x".to_string(),
        };
        assert!(RetryScope::Errors.includes(&error));
        assert!(!RetryScope::Errors.includes(&FetchOutcome::FailedNotFound));
        assert!(RetryScope::AllFailures.includes(&FetchOutcome::FailedNotFound));
        assert!(!RetryScope::AllFailures.includes(&FetchOutcome::Downloaded));
    }

    #[test]
    fn test_empty_plan() {
        let plan = AcquisitionPlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.pending(), 0);
    }
}
