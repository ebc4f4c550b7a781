//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geoprep::config::ConfigFileError;
use geoprep::fetch::TransportError;
use geoprep::grid::GridError;
use geoprep::stages::GraphError;
use geoprep::timeline::TimelineError;
use geoprep::validation::ManifestError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read, parsed or written
    ConfigFile(ConfigFileError),
    /// Region, tile size or tile identifier rejected
    Grid(GridError),
    /// HTTP client could not be created
    Transport(TransportError),
    /// Required external tools are unusable
    Toolchain(Vec<String>),
    /// Malformed stage graph
    Graph(GraphError),
    /// Manifest could not be loaded
    Manifest(ManifestError),
    /// Timeline conversion failed
    Timeline(TimelineError),
    /// Failed to write output file
    FileWrite { path: String, error: std::io::Error },
    /// Interactive prompt failed
    Prompt(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Toolchain(problems) => {
                for problem in problems {
                    eprintln!("  - {}", problem);
                }
                eprintln!();
                eprintln!("GDAL command-line tools are required for processing:");
                eprintln!("  Debian/Ubuntu: sudo apt install gdal-bin unzip");
                eprintln!("  macOS:         brew install gdal");
                eprintln!("Or point [toolchain] bin_dir in config.ini at the GDAL binaries.");
            }
            CliError::ConfigFile(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Fix the value in config.ini, or run 'geoprep config show' to");
                eprintln!("see the effective configuration.");
            }
            CliError::Grid(GridError::InvalidTileId(_)) => {
                eprintln!();
                eprintln!("Tile identifiers look like N050E020_N055E025.");
                eprintln!("Run 'geoprep tiles' to list the identifiers of the configured grid.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Grid(e) => write!(f, "{}", e),
            CliError::Transport(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Toolchain(problems) => {
                write!(f, "{} required tool(s) unavailable", problems.len())
            }
            CliError::Graph(e) => write!(f, "Invalid stage graph: {}", e),
            CliError::Manifest(e) => write!(f, "{}", e),
            CliError::Timeline(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Grid(e) => Some(e),
            CliError::Transport(e) => Some(e),
            CliError::Graph(e) => Some(e),
            CliError::Manifest(e) => Some(e),
            CliError::Timeline(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<GridError> for CliError {
    fn from(e: GridError) -> Self {
        CliError::Grid(e)
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::Transport(e)
    }
}

impl From<GraphError> for CliError {
    fn from(e: GraphError) -> Self {
        CliError::Graph(e)
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        CliError::Manifest(e)
    }
}

impl From<TimelineError> for CliError {
    fn from(e: TimelineError) -> Self {
        CliError::Timeline(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::Toolchain(vec!["gdalwarp not found".to_string()]);
        assert_eq!(err.to_string(), "1 required tool(s) unavailable");

        let err: CliError = GridError::InvalidTileSize(7).into();
        assert!(err.to_string().contains("divides 90"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err: CliError = GraphError::DuplicateStage("crop".to_string()).into();
        assert!(err.source().is_some());
        assert!(CliError::Config("x".to_string()).source().is_none());
    }
}
