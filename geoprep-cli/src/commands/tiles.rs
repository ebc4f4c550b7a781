//! Tiles command - list the configured grid.

use console::style;
use geoprep::fetch::has_content;

use super::common::heading;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the tiles command.
pub fn run(runner: &CliRunner) -> Result<i32, CliError> {
    runner.log_startup("tiles");
    let grid = runner.config().tile_grid()?;
    let region = grid.region();

    heading(format!(
        "Tile grid: {}°E-{}°E, {}°N-{}°N at {}° ({} tiles)",
        region.west,
        region.east,
        region.south,
        region.north,
        grid.tile_size(),
        grid.len()
    ));
    println!("Destination: {}", grid.destination_dir().display());
    println!();

    let mut present = 0;
    for tile in grid.tiles() {
        let status = if has_content(&tile.destination) {
            present += 1;
            style("present ").green()
        } else {
            style("missing ").yellow()
        };
        println!("{:>3}  {}  {}  {}", tile.index, tile.id, status, tile.url);
    }

    println!();
    println!("{} of {} tiles present", present, grid.len());
    Ok(0)
}
