//! GeoPrep CLI - Command-line interface
//!
//! Fetches elevation tiles and boundary datasets, runs the GDAL processing
//! stages and validates the resulting artifacts.

mod commands;
mod error;
mod runner;
mod ui;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use commands::common::RetryMode;
use commands::config::ConfigCommands;
use commands::convert::ConvertArgs;
use commands::events::EventsArgs;
use commands::fetch::FetchArgs;
use commands::process::ProcessArgs;
use commands::validate::ValidateArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "geoprep")]
#[command(version, about = "Geospatial data preparation for campaign maps", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.geoprep/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the elevation tiles covering the configured region
    Tiles,

    /// Download elevation tiles (or boundary datasets with --boundaries)
    Fetch {
        /// Show what would be downloaded and exit
        #[arg(long)]
        plan: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Concurrent downloads (overrides config)
        #[arg(long)]
        parallel: Option<usize>,

        /// Only these tile identifiers (e.g. N050E020_N055E025)
        #[arg(long, num_args = 1.., conflicts_with = "from")]
        only: Vec<String>,

        /// Start at this position in the tile list
        #[arg(long)]
        from: Option<usize>,

        /// Download even when the file already exists
        #[arg(long)]
        force: bool,

        /// Fetch the Natural Earth boundary datasets instead of tiles
        #[arg(long, conflicts_with_all = ["only", "from"])]
        boundaries: bool,

        /// Retry failed downloads once
        #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "errors")]
        retry: Option<RetryMode>,
    },

    /// Unpack tiles and build the merged, cropped and derived rasters
    Process {
        /// Also produce the reprojected raster
        #[arg(long)]
        reproject: bool,

        /// Rebuild outputs that already exist
        #[arg(long)]
        force: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Convert boundary shapefiles to GeoJSON layers
    Convert {
        /// Rebuild layers that already exist
        #[arg(long)]
        force: bool,
    },

    /// Convert the campaign timeline to an events GeoJSON collection
    Events {
        /// Timeline JSON (default: <data>/timeline.json)
        input: Option<PathBuf>,

        /// Output path (default: <data>/geojson/events.geojson)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the produced artifacts and report readiness (exit 0/1/2)
    Validate {
        /// JSON manifest listing the artifacts to check
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => e.exit(),
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    let Cli {
        config,
        debug,
        command,
    } = cli;

    // Config commands must work even when the file fails to parse
    let command = match command {
        Commands::Config { command } => return commands::config::run(command, config.as_deref()),
        other => other,
    };

    let runner = CliRunner::new(config.as_deref(), debug)?;

    match command {
        Commands::Tiles => commands::tiles::run(&runner),
        Commands::Fetch {
            plan,
            yes,
            parallel,
            only,
            from,
            force,
            boundaries,
            retry,
        } => commands::fetch::run(
            &runner,
            FetchArgs {
                plan,
                yes,
                parallel,
                only,
                from,
                force,
                boundaries,
                retry,
            },
        ),
        Commands::Process {
            reproject,
            force,
            yes,
        } => commands::process::run(
            &runner,
            ProcessArgs {
                reproject,
                force,
                yes,
            },
        ),
        Commands::Convert { force } => commands::convert::run(&runner, ConvertArgs { force }),
        Commands::Events { input, output } => {
            commands::events::run(&runner, EventsArgs { input, output })
        }
        Commands::Validate { manifest } => {
            commands::validate::run(&runner, ValidateArgs { manifest })
        }
        Commands::Config { command } => commands::config::run(command, Some(runner.config_path())),
    }
}
