//! Configuration management CLI commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use geoprep::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a configuration file with default values if none exists
    Init {
        /// Overwrite an existing file with defaults
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand against `config_path` or the default location.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<i32, CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    match command {
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Init { force } => run_init(path, force),
    }
}

fn run_path(path: &Path) -> Result<i32, CliError> {
    println!("{}", path.display());
    Ok(0)
}

fn run_show(path: &Path) -> Result<i32, CliError> {
    let config = ConfigFile::load_from(path)?;
    if !path.exists() {
        println!("; {} does not exist, showing defaults", path.display());
    }
    print!("{}", config.to_ini_string());
    Ok(0)
}

fn run_init(path: PathBuf, force: bool) -> Result<i32, CliError> {
    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists (use --force to reset it)", path.display());
        return Ok(0);
    }

    println!();
    println!("Edit this file to set the region, data directory and GDAL location.");
    println!("CLI arguments override config file values when specified.");
    Ok(0)
}
