//! Configuration for GeoPrep.
//!
//! User settings live in `~/.geoprep/config.ini` (or a file passed on the
//! command line). Every key is optional; missing keys fall back to the
//! defaults in [`defaults`].
//!
//! # Example
//!
//! ```
//! use geoprep::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let grid = config.tile_grid().unwrap();
//! assert_eq!(grid.tile_size(), 5);
//! ```

pub mod defaults;
mod file;
mod layout;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::{config_directory, config_file_path, default_log_file};
pub use file::ConfigFileError;
pub use layout::ProjectLayout;
pub use settings::{
    AcquisitionSettings, ConfigFile, LoggingSettings, PathsSettings, ProcessingSettings,
    RegionSettings, ToolchainSettings,
};
pub use size::{format_size, parse_size, SizeParseError};
