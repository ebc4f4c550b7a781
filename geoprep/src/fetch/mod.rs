//! Single-file fetching with skip, streaming and atomic placement.
//!
//! [`Fetcher`] is the one download path used by every acquisition flow
//! (elevation tiles and boundary datasets alike). It:
//! - skips destinations that already hold a non-empty file
//! - streams the body in fixed-size chunks to a `<file>.part` sibling
//! - renames the sibling onto the destination only after the body is complete
//! - reports every failure as a [`FetchOutcome`] value instead of an error
//!
//! A failed or interrupted fetch therefore never leaves a file at the
//! destination, and a later existence check cannot be fooled by a truncated
//! download.

mod http;
mod transport;

pub use http::{HttpTransport, DEFAULT_TIMEOUT_SECS};
pub use transport::{Transport, TransportError, TransportResponse};

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::grid::TileSpec;

/// Default chunk size for streamed writes.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Suffix of the temporary file a download is streamed into.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Byte progress callback: `(downloaded, total)`, total is 0 when unknown.
pub type ProgressCallback<'a> = dyn Fn(u64, u64) + Send + Sync + 'a;

/// Options for a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Return `SkippedExisting` when the destination already holds data.
    pub skip_if_exists: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Read/write chunk size in bytes.
    pub chunk_size: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            skip_if_exists: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FetchOptions {
    pub fn with_skip_if_exists(mut self, skip: bool) -> Self {
        self.skip_if_exists = skip;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the chunk size (minimum 1 byte).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Something to download: an identifier, where it lives, where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    /// Identifier used in results and reports (tile id, dataset name).
    pub id: String,
    /// Remote locator.
    pub locator: String,
    /// Local destination path.
    pub destination: PathBuf,
}

impl FetchTarget {
    pub fn new(
        id: impl Into<String>,
        locator: impl Into<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
            destination: destination.into(),
        }
    }
}

impl From<&TileSpec> for FetchTarget {
    fn from(tile: &TileSpec) -> Self {
        Self::new(tile.id.to_string(), tile.url.clone(), tile.destination.clone())
    }
}

/// Terminal outcome of one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was downloaded and placed at the destination.
    Downloaded,
    /// The destination already held data; no request was made.
    SkippedExisting,
    /// The server reported the resource as absent.
    FailedNotFound,
    /// Any other failure.
    FailedError { reason: String },
}

impl FetchOutcome {
    /// Check whether this outcome is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FailedNotFound | Self::FailedError { .. })
    }

    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloaded => "downloaded",
            Self::SkippedExisting => "skipped-existing",
            Self::FailedNotFound => "failed-not-found",
            Self::FailedError { .. } => "failed-error",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailedError { reason } => write!(f, "{}: {}", self.label(), reason),
            _ => write!(f, "{}", self.label()),
        }
    }
}

/// Result of fetching one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Identifier of the fetched target.
    pub id: String,
    /// What happened.
    pub outcome: FetchOutcome,
    /// Bytes written to the destination by this fetch.
    pub bytes: u64,
}

impl FetchResult {
    pub fn new(id: impl Into<String>, outcome: FetchOutcome, bytes: u64) -> Self {
        Self {
            id: id.into(),
            outcome,
            bytes,
        }
    }
}

/// Failure while streaming, before it is flattened into an outcome.
enum StreamError {
    Transport(TransportError),
    Read { reason: String },
    Write { path: PathBuf, source: io::Error },
}

impl StreamError {
    fn into_outcome(self) -> FetchOutcome {
        match self {
            Self::Transport(TransportError::NotFound { .. }) => FetchOutcome::FailedNotFound,
            Self::Transport(e) => FetchOutcome::FailedError {
                reason: e.to_string(),
            },
            Self::Read { reason } => FetchOutcome::FailedError {
                reason: format!("read error: {}", reason),
            },
            Self::Write { path, source } => FetchOutcome::FailedError {
                reason: format!("failed to write {}: {}", path.display(), source),
            },
        }
    }
}

/// Downloads targets through a [`Transport`].
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Create a fetcher over the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create a fetcher over a new HTTP transport.
    pub fn http() -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::new()?)))
    }

    /// Check whether fetching `target` would be skipped without a request.
    pub fn would_skip(&self, target: &FetchTarget, options: &FetchOptions) -> bool {
        options.skip_if_exists && has_content(&target.destination)
    }

    /// Fetch a target without progress reporting.
    pub fn fetch(&self, target: &FetchTarget, options: &FetchOptions) -> FetchResult {
        self.fetch_with_progress(target, options, None)
    }

    /// Fetch a target, reporting byte progress as chunks arrive.
    pub fn fetch_with_progress(
        &self,
        target: &FetchTarget,
        options: &FetchOptions,
        on_progress: Option<&ProgressCallback<'_>>,
    ) -> FetchResult {
        if self.would_skip(target, options) {
            debug!(id = %target.id, path = %target.destination.display(), "Destination exists, skipping");
            return FetchResult::new(&target.id, FetchOutcome::SkippedExisting, 0);
        }

        let partial = partial_path(&target.destination);
        debug!(id = %target.id, url = %target.locator, "Fetching");

        let streamed = self
            .stream_to(target, &partial, options, on_progress)
            .and_then(|bytes| {
                fs::rename(&partial, &target.destination)
                    .map(|_| bytes)
                    .map_err(|e| StreamError::Write {
                        path: target.destination.clone(),
                        source: e,
                    })
            });

        match streamed {
            Ok(bytes) => {
                info!(id = %target.id, bytes, "Downloaded");
                FetchResult::new(&target.id, FetchOutcome::Downloaded, bytes)
            }
            Err(e) => {
                // The partial file may or may not exist depending on where
                // the failure happened.
                let _ = fs::remove_file(&partial);
                let outcome = e.into_outcome();
                match &outcome {
                    FetchOutcome::FailedNotFound => {
                        info!(id = %target.id, url = %target.locator, "Not available on server")
                    }
                    other => warn!(id = %target.id, outcome = %other, "Fetch failed"),
                }
                FetchResult::new(&target.id, outcome, 0)
            }
        }
    }

    /// Stream the response body into `partial`, returning bytes written.
    fn stream_to(
        &self,
        target: &FetchTarget,
        partial: &Path,
        options: &FetchOptions,
        on_progress: Option<&ProgressCallback<'_>>,
    ) -> Result<u64, StreamError> {
        let mut response = self
            .transport
            .get(&target.locator, options.timeout)
            .map_err(StreamError::Transport)?;

        let write_err = |e: io::Error| StreamError::Write {
            path: partial.to_path_buf(),
            source: e,
        };

        if let Some(parent) = partial.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let file = File::create(partial).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; options.chunk_size.max(1)];
        let total = response.content_length.unwrap_or(0);
        let mut downloaded = 0u64;

        loop {
            let bytes_read = match response.body.read(&mut buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(StreamError::Read {
                        reason: e.to_string(),
                    })
                }
            };

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(write_err)?;

            downloaded += bytes_read as u64;

            if let Some(cb) = on_progress {
                cb(downloaded, total);
            }
        }

        writer.flush().map_err(write_err)?;

        if let Some(expected) = response.content_length {
            if downloaded != expected {
                return Err(StreamError::Read {
                    reason: format!(
                        "body ended after {} of {} bytes",
                        downloaded, expected
                    ),
                });
            }
        }

        Ok(downloaded)
    }
}

/// Check whether a path is a file with at least one byte.
pub fn has_content(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Temporary sibling a download is streamed into.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}
