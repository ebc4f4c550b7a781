//! Integration tests for tile acquisition.
//!
//! These tests drive the full acquisition flow against a scripted transport:
//! - grid enumeration → fetch targets → orchestrated download
//! - per-target outcomes and atomic placement on disk
//! - retry over the failed subset and merging into the first summary
//! - parallel runs and cancellation
//!
//! Run with: `cargo test --test acquisition_integration`

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use geoprep::acquisition::{
    AcquisitionConfig, AcquisitionEvent, AcquisitionOrchestrator, EventCallback, RetryScope,
};
use geoprep::cancel::CancelFlag;
use geoprep::fetch::{
    partial_path, FetchOutcome, FetchTarget, Fetcher, Transport, TransportError,
    TransportResponse,
};
use geoprep::grid::{Region, TileGrid};

// ============================================================================
// Helper Functions
// ============================================================================

/// How the scripted server answers a URL.
#[derive(Clone)]
enum Reply {
    Body(Vec<u8>),
    NotFound,
    /// Fail with a connection error this many times, then serve the body.
    Flaky(usize, Vec<u8>),
    /// Announce more bytes than the body holds.
    Truncated(Vec<u8>),
}

/// In-memory server answering from a script and counting requests.
struct ScriptedTransport {
    replies: HashMap<String, Reply>,
    requests: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    fn new(replies: impl IntoIterator<Item = (String, Reply)>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            requests: Mutex::new(HashMap::new()),
        }
    }

    fn requests_for(&self, url: &str) -> usize {
        self.requests.lock().get(url).copied().unwrap_or(0)
    }

    fn total_requests(&self) -> usize {
        self.requests.lock().values().sum()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, _timeout: Duration) -> Result<TransportResponse, TransportError> {
        let attempt = {
            let mut requests = self.requests.lock();
            let count = requests.entry(url.to_string()).or_default();
            *count += 1;
            *count
        };

        match self.replies.get(url) {
            Some(Reply::Body(body)) => Ok(TransportResponse::new(
                Some(body.len() as u64),
                Cursor::new(body.clone()),
            )),
            Some(Reply::Flaky(failures, body)) if attempt > *failures => Ok(
                TransportResponse::new(Some(body.len() as u64), Cursor::new(body.clone())),
            ),
            Some(Reply::Flaky(..)) => Err(TransportError::Connection {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            }),
            Some(Reply::Truncated(body)) => Ok(TransportResponse::new(
                Some(body.len() as u64 + 100),
                Cursor::new(body.clone()),
            )),
            Some(Reply::NotFound) | None => Err(TransportError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

/// Orchestrator over `transport` with no pause between requests.
fn orchestrator(transport: Arc<ScriptedTransport>, parallel: usize) -> AcquisitionOrchestrator {
    let config = AcquisitionConfig::default()
        .with_request_delay(Duration::ZERO)
        .with_parallel(parallel);
    AcquisitionOrchestrator::new(Fetcher::new(transport), config)
}

fn target(dir: &Path, id: &str) -> FetchTarget {
    FetchTarget::new(
        id,
        format!("https://tiles.test/{}.zip", id),
        dir.join(format!("{}.zip", id)),
    )
}

fn body(id: &str) -> Vec<u8> {
    format!("archive bytes for {}", id).into_bytes()
}

/// Region of the campaign's western approach: two latitude bands, three
/// longitude bands at 5°.
fn western_grid(dir: &Path) -> TileGrid {
    let region = Region::new(20.0, 50.0, 35.0, 60.0).unwrap();
    TileGrid::new(region, 5)
        .unwrap()
        .with_base_url("https://tiles.test/aw3d30")
        .with_extension(".zip")
        .with_destination_dir(dir)
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Every grid tile flows through to a downloaded file at its destination.
#[test]
fn test_grid_to_downloaded_files() {
    let temp = TempDir::new().unwrap();
    let grid = western_grid(temp.path());
    let tiles = grid.tiles();
    assert_eq!(tiles.len(), 6);

    let transport = Arc::new(ScriptedTransport::new(
        tiles
            .iter()
            .map(|t| (t.url.clone(), Reply::Body(body(&t.id.to_string())))),
    ));
    let targets: Vec<FetchTarget> = tiles.iter().map(FetchTarget::from).collect();

    let summary = orchestrator(Arc::clone(&transport), 1).execute(&targets, None);

    assert!(summary.is_complete());
    assert_eq!(summary.downloaded(), 6);
    for tile in &tiles {
        let written = std::fs::read(&tile.destination).unwrap();
        assert_eq!(written, body(&tile.id.to_string()));
        assert!(!partial_path(&tile.destination).exists());
    }
    assert_eq!(transport.total_requests(), 6);
}

/// Not-found and error outcomes are reported per target and leave nothing
/// behind on disk.
#[test]
fn test_mixed_outcomes_leave_no_partial_files() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let targets = vec![
        target(dir, "present"),
        target(dir, "absent"),
        target(dir, "flaky"),
        target(dir, "truncated"),
    ];

    let transport = Arc::new(ScriptedTransport::new([
        (targets[0].locator.clone(), Reply::Body(body("present"))),
        (targets[1].locator.clone(), Reply::NotFound),
        (targets[2].locator.clone(), Reply::Flaky(1, body("flaky"))),
        (targets[3].locator.clone(), Reply::Truncated(body("truncated"))),
    ]));

    let summary = orchestrator(transport, 1).execute(&targets, None);

    assert_eq!(summary.downloaded(), 1);
    assert_eq!(summary.failed(), 3);
    assert_eq!(summary.not_found_ids(), vec!["absent"]);
    assert_eq!(summary.error_ids(), vec!["flaky", "truncated"]);
    assert!(!summary.is_complete());

    for t in &targets[1..] {
        assert!(!t.destination.exists(), "{} should not exist", t.id);
        assert!(!partial_path(&t.destination).exists());
    }
}

/// Retrying errors fetches only the failed subset; not-found targets are
/// left alone unless every failure is retried.
#[test]
fn test_retry_errors_then_merge() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let targets = vec![
        target(dir, "ok"),
        target(dir, "absent"),
        target(dir, "flaky"),
    ];

    let transport = Arc::new(ScriptedTransport::new([
        (targets[0].locator.clone(), Reply::Body(body("ok"))),
        (targets[1].locator.clone(), Reply::NotFound),
        (targets[2].locator.clone(), Reply::Flaky(1, body("flaky"))),
    ]));
    let orchestrator = orchestrator(Arc::clone(&transport), 1);

    let mut summary = orchestrator.execute(&targets, None);
    assert_eq!(summary.failed_ids(), vec!["absent", "flaky"]);

    let retry = orchestrator.retry_failed(&summary, &targets, RetryScope::Errors, None);
    assert_eq!(retry.results.len(), 1);
    assert_eq!(retry.results[0].id, "flaky");
    assert_eq!(retry.results[0].outcome, FetchOutcome::Downloaded);

    summary.merge_retry(retry);
    assert_eq!(summary.downloaded(), 2);
    assert_eq!(summary.failed_ids(), vec!["absent"]);

    assert_eq!(transport.requests_for(&targets[0].locator), 1);
    assert_eq!(transport.requests_for(&targets[1].locator), 1);
    assert_eq!(transport.requests_for(&targets[2].locator), 2);

    let retry_all = orchestrator.retry_failed(&summary, &targets, RetryScope::AllFailures, None);
    assert_eq!(retry_all.not_found_ids(), vec!["absent"]);
    assert_eq!(transport.requests_for(&targets[1].locator), 2);
}

/// A second run over the same targets makes no requests.
#[test]
fn test_existing_files_are_skipped() {
    let temp = TempDir::new().unwrap();
    let grid = western_grid(temp.path());
    let tiles = grid.tiles();
    let targets: Vec<FetchTarget> = tiles.iter().map(FetchTarget::from).collect();

    let transport = Arc::new(ScriptedTransport::new(
        tiles.iter().map(|t| (t.url.clone(), Reply::Body(body("x")))),
    ));
    let orchestrator = orchestrator(Arc::clone(&transport), 1);

    // Pretend two tiles survived an earlier run
    std::fs::write(&targets[0].destination, b"kept").unwrap();
    std::fs::write(&targets[4].destination, b"kept").unwrap();

    let plan = orchestrator.plan(&targets);
    assert_eq!(plan.total, 6);
    assert_eq!(plan.existing, 2);
    assert_eq!(plan.pending(), 4);

    let first = orchestrator.execute(&targets, None);
    assert_eq!(first.downloaded(), 4);
    assert_eq!(first.skipped(), 2);
    assert_eq!(std::fs::read(&targets[0].destination).unwrap(), b"kept");

    let second = orchestrator.execute(&targets, None);
    assert_eq!(second.skipped(), 6);
    assert_eq!(transport.total_requests(), 4);
    assert!(orchestrator.plan(&targets).is_empty());
}

/// Parallel runs attribute results by target position and emit one
/// start/finish pair per requested target.
#[test]
fn test_parallel_run_keeps_target_order() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let ids: Vec<String> = (0..12).map(|i| format!("tile{:02}", i)).collect();
    let targets: Vec<FetchTarget> = ids.iter().map(|id| target(dir, id)).collect();

    let transport = Arc::new(ScriptedTransport::new(targets.iter().map(|t| {
        let reply = if t.id == "tile05" {
            Reply::NotFound
        } else {
            Reply::Body(body(&t.id))
        };
        (t.locator.clone(), reply)
    })));

    let events: Mutex<Vec<AcquisitionEvent>> = Mutex::new(Vec::new());
    let on_event: &EventCallback<'_> = &|event| events.lock().push(event.clone());

    let summary = orchestrator(transport, 4).execute(&targets, Some(on_event));

    let result_ids: Vec<&str> = summary.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(result_ids, ids.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(summary.downloaded(), 11);
    assert_eq!(summary.not_found_ids(), vec!["tile05"]);

    let events = events.lock();
    let started = events
        .iter()
        .filter(|e| matches!(e, AcquisitionEvent::Started { .. }))
        .count();
    let finished = events
        .iter()
        .filter(|e| matches!(e, AcquisitionEvent::Finished { .. }))
        .count();
    assert_eq!(started, 12);
    assert_eq!(finished, 12);
}

/// Targets sharing a destination are fetched once even when workers race
/// for them; the rest find the file in place.
#[test]
fn test_parallel_shared_destination_fetched_once() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("shared.zip");
    let targets: Vec<FetchTarget> = (0..8)
        .map(|i| {
            FetchTarget::new(
                format!("copy{}", i),
                format!("https://tiles.test/copy{}.zip", i),
                destination.clone(),
            )
        })
        .collect();

    let transport = Arc::new(ScriptedTransport::new(
        targets
            .iter()
            .map(|t| (t.locator.clone(), Reply::Body(body("shared")))),
    ));

    let summary = orchestrator(Arc::clone(&transport), 4).execute(&targets, None);

    assert_eq!(transport.total_requests(), 1);
    assert_eq!(summary.downloaded(), 1);
    assert_eq!(summary.skipped(), 7);
    assert!(summary.is_complete());
    assert_eq!(std::fs::read(&destination).unwrap(), body("shared"));
    assert!(!partial_path(&destination).exists());
}

/// A run cancelled before it starts attempts nothing.
#[test]
fn test_cancelled_run_lists_not_attempted() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let targets = vec![target(dir, "a"), target(dir, "b")];
    let transport = Arc::new(ScriptedTransport::new(Vec::<(String, Reply)>::new()));

    let cancel = CancelFlag::new();
    cancel.cancel();
    let summary = orchestrator(Arc::clone(&transport), 1)
        .with_cancel(cancel)
        .execute(&targets, None);

    assert!(summary.cancelled);
    assert!(summary.results.is_empty());
    assert_eq!(summary.not_attempted, vec!["a", "b"]);
    assert!(!summary.is_complete());
    assert_eq!(transport.total_requests(), 0);
}
