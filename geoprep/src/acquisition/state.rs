//! Result tracking for one acquisition run.
//!
//! Results are stored by target position, so attribution does not depend on
//! the order in which workers finish.

use crate::fetch::{FetchOutcome, FetchResult, FetchTarget};

/// Per-target result slots for one run.
#[derive(Debug, Clone)]
pub struct AcquisitionState {
    ids: Vec<String>,
    slots: Vec<Option<FetchResult>>,
}

impl AcquisitionState {
    /// Create empty state for the given targets.
    pub fn new(targets: &[FetchTarget]) -> Self {
        Self {
            ids: targets.iter().map(|t| t.id.clone()).collect(),
            slots: vec![None; targets.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record the result for the target at `index`.
    ///
    /// A recorded result is terminal; later records for the same index are
    /// ignored.
    pub fn record(&mut self, index: usize, result: FetchResult) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.is_none() {
                *slot = Some(result);
            }
        }
    }

    /// Number of targets with a recorded result.
    pub fn attempted(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Finish the run and produce its summary.
    pub fn into_summary(self, cancelled: bool) -> AcquisitionSummary {
        let mut results = Vec::with_capacity(self.slots.len());
        let mut not_attempted = Vec::new();

        for (id, slot) in self.ids.into_iter().zip(self.slots) {
            match slot {
                Some(result) => results.push(result),
                None => not_attempted.push(id),
            }
        }

        AcquisitionSummary {
            results,
            not_attempted,
            cancelled,
        }
    }
}

/// Outcome of an acquisition run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquisitionSummary {
    /// Results in target order.
    pub results: Vec<FetchResult>,
    /// Targets never attempted because the run was cancelled.
    pub not_attempted: Vec<String>,
    /// Whether the run was cancelled before finishing.
    pub cancelled: bool,
}

impl AcquisitionSummary {
    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    fn ids(&self, pred: impl Fn(&FetchOutcome) -> bool) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| pred(&r.outcome))
            .map(|r| r.id.clone())
            .collect()
    }

    /// Number of targets downloaded in this run.
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Downloaded))
    }

    /// Number of targets skipped because they already existed.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::SkippedExisting))
    }

    /// Number of failed targets (not-found and errors).
    pub fn failed(&self) -> usize {
        self.count(FetchOutcome::is_failure)
    }

    /// Identifiers of all failed targets, in target order.
    pub fn failed_ids(&self) -> Vec<String> {
        self.ids(FetchOutcome::is_failure)
    }

    /// Identifiers of targets the server reported as absent.
    pub fn not_found_ids(&self) -> Vec<String> {
        self.ids(|o| matches!(o, FetchOutcome::FailedNotFound))
    }

    /// Identifiers of targets that failed for any other reason.
    pub fn error_ids(&self) -> Vec<String> {
        self.ids(|o| matches!(o, FetchOutcome::FailedError { .. }))
    }

    /// Total bytes downloaded in this run.
    pub fn bytes(&self) -> u64 {
        self.results.iter().map(|r| r.bytes).sum()
    }

    /// Look up the result for an identifier.
    pub fn result(&self, id: &str) -> Option<&FetchResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// Check whether every target ended downloaded or skipped.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.not_attempted.is_empty() && self.failed() == 0
    }

    /// Fold the summary of a retry run into this one.
    ///
    /// Results from the retry replace earlier results with the same
    /// identifier.
    pub fn merge_retry(&mut self, retry: AcquisitionSummary) {
        for result in retry.results {
            match self.results.iter_mut().find(|r| r.id == result.id) {
                Some(existing) => *existing = result,
                None => self.results.push(result),
            }
        }
        let results = &self.results;
        self.not_attempted
            .retain(|id| !results.iter().any(|r| &r.id == id));
        self.cancelled = retry.cancelled;
    }
}
