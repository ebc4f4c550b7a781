//! Events command - campaign timeline to events GeoJSON.

use std::path::PathBuf;

use console::style;
use geoprep::timeline::{check_events, convert, load_timeline, write_collection, EventStatistics};
use tracing::{info, warn};

use super::common::heading;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the events command.
pub struct EventsArgs {
    /// Timeline JSON; `<data>/timeline.json` when absent.
    pub input: Option<PathBuf>,
    /// Output GeoJSON; `<data>/geojson/events.geojson` when absent.
    pub output: Option<PathBuf>,
}

/// Run the events command.
///
/// The collection is written even when some events are malformed; the exit
/// code is 1 in that case.
pub fn run(runner: &CliRunner, args: EventsArgs) -> Result<i32, CliError> {
    runner.log_startup("events");
    let layout = runner.layout();
    let input = args.input.unwrap_or_else(|| layout.timeline_path());
    let output = args.output.unwrap_or_else(|| layout.events_path());

    let collection = convert(&load_timeline(&input)?)?;
    let issues = check_events(&collection);
    write_collection(&output, &collection)?;
    info!(path = %output.display(), "Events collection written");

    let stats = EventStatistics::from_collection(&collection);
    heading(format!("{} events → {}", stats.total, output.display()));
    if let (Some((first, last)), Some(days)) = (stats.date_range, stats.duration_days()) {
        println!("  Dates:  {} to {} ({} days)", first, last, days);
    }
    if let Some((lat_lo, lat_hi, lon_lo, lon_hi)) = stats.extent {
        println!(
            "  Extent: {:.2}°N-{:.2}°N, {:.2}°E-{:.2}°E",
            lat_lo, lat_hi, lon_lo, lon_hi
        );
    }
    for (kind, count) in &stats.by_type {
        println!("  {:<14} {}", kind, count);
    }

    if issues.is_empty() {
        return Ok(0);
    }

    println!();
    println!("{}", style(format!("{} malformed event(s):", issues.len())).yellow());
    for issue in &issues {
        warn!("{}", issue);
        println!("  - {}", issue);
    }
    Ok(1)
}
