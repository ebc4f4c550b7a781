//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and the Ctrl-C
//! handler to reduce duplication across command handlers.

use std::path::{Path, PathBuf};

use console::Term;
use geoprep::cancel::CancelFlag;
use geoprep::config::{config_file_path, ConfigFile, ProjectLayout};
use geoprep::logging::{init_logging, LoggingGuard, DEFAULT_LOG_FILE};
use tracing::{info, warn};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Load config (from `config_path` or the default location) and
    /// initialize logging.
    ///
    /// Log lines are mirrored to stdout only when stdout is not a terminal,
    /// so they never interleave with progress bars.
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

        let stdout_enabled = !Term::stdout().is_term();

        let logging_guard = init_logging(&log_dir, &log_file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn layout(&self) -> ProjectLayout {
        self.config.layout()
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("GeoPrep v{}", geoprep::VERSION);
        info!(config = %self.config_path.display(), "GeoPrep CLI: {} command", command);
    }

    /// Install a Ctrl-C handler that trips the returned flag.
    ///
    /// Running work stops at the next tile or stage boundary.
    pub fn cancel_on_interrupt(&self) -> Result<CancelFlag, CliError> {
        let cancel = CancelFlag::new();
        let handler_flag = cancel.clone();

        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Interrupted, finishing current step...");
            warn!("Received interrupt, cancelling");
            handler_flag.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        Ok(cancel)
    }
}
