//! Process command - unpack tiles and run the elevation graph.

use std::sync::Arc;

use console::style;
use geoprep::stages::dem::{build_dem_graph, discover_rasters, DemGraphConfig, STAGE_CROP};
use geoprep::stages::summary::ProcessingSummary;
use geoprep::stages::unpack::{build_unpack_graph, find_archives};
use geoprep::stages::{StageEventCallback, StageGraphRunner};
use geoprep::toolchain::{raster_statistics, ToolRunner, GDAL_TOOLS};
use tracing::{info, warn};

use super::common::{
    confirm, heading, print_run_report, require_tools, required_programs, run_exit_code,
};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::StageProgress;

/// Arguments for the process command.
pub struct ProcessArgs {
    pub reproject: bool,
    pub force: bool,
    pub yes: bool,
}

/// Run the process command.
///
/// Exits 0 when every stage succeeded, 1 when some optional product failed
/// and 2 when a required stage failed or there was nothing to process.
pub fn run(runner: &CliRunner, args: ProcessArgs) -> Result<i32, CliError> {
    runner.log_startup("process");
    let config = runner.config();
    let layout = runner.layout();

    let mut dem = config.dem_config()?;
    dem.reproject |= args.reproject;

    layout.ensure_dirs().map_err(|e| CliError::FileWrite {
        path: layout.data_dir().display().to_string(),
        error: e,
    })?;

    let tiles_dir = layout.dem_tiles_dir();
    let archives = find_archives(&tiles_dir);

    let tools: Arc<dyn ToolRunner> = Arc::new(config.tool_runner());
    require_tools(tools.as_ref(), &required_programs(GDAL_TOOLS, &archives))?;

    let cancel = runner.cancel_on_interrupt()?;
    let progress = StageProgress::new();
    let on_event: &StageEventCallback<'_> = &|event| progress.handle(event);

    if !archives.is_empty() {
        info!(archives = archives.len(), "Unpacking tile archives");
        let report = StageGraphRunner::new(Arc::clone(&tools))
            .with_cancel(cancel.clone())
            .run_with_events(&build_unpack_graph(&archives), Some(on_event))?;
        if !report.failed().is_empty() {
            warn!(failed = ?report.failed(), "Some archives could not be extracted");
        }
    }

    let rasters = discover_rasters(&tiles_dir);
    if rasters.is_empty() {
        progress.finish();
        eprintln!(
            "{} No elevation rasters found under {}",
            style("✗").red(),
            tiles_dir.display()
        );
        eprintln!("Run 'geoprep fetch' first to download the tiles.");
        return Ok(2);
    }

    progress.suspend(|| print_plan(&dem, rasters.len()));
    let proceed = progress.suspend(|| confirm("Run the processing stages?", args.yes))?;
    if !proceed {
        progress.finish();
        println!("Aborted.");
        return Ok(0);
    }

    let report = StageGraphRunner::new(Arc::clone(&tools))
        .with_reuse_existing(!args.force)
        .with_cancel(cancel)
        .run_with_events(&build_dem_graph(&dem, &rasters), Some(on_event))?;
    progress.finish();
    print_run_report(&report);

    let mut summary = ProcessingSummary::from_report(&dem, &report);
    if report.result(STAGE_CROP).is_some_and(|r| r.outcome.is_success()) {
        match raster_statistics(tools.as_ref(), &dem.cropped_path()) {
            Ok(stats) => summary = summary.with_statistics(stats),
            Err(e) => warn!(error = %e, "Could not compute raster statistics"),
        }
    }

    let summary_path = dem.summary_path();
    summary
        .write_to(&summary_path)
        .map_err(|e| CliError::FileWrite {
            path: summary_path.display().to_string(),
            error: e,
        })?;
    println!("Summary written to {}", summary_path.display());

    Ok(run_exit_code(&report))
}

fn print_plan(dem: &DemGraphConfig, rasters: usize) {
    let r = &dem.region;
    heading("Elevation processing");
    println!("  Source rasters: {}", rasters);
    println!(
        "  Region:         {}°E-{}°E, {}°N-{}°N",
        r.west, r.east, r.south, r.north
    );
    println!("  Resolution:     {}° ({})", dem.resolution, dem.resampling);
    println!("  Contours:       every {} m", dem.contour_interval);
    println!(
        "  Heightmap:      {}x{} px",
        dem.heightmap_size, dem.heightmap_size
    );
    if dem.reproject {
        println!("  Reproject to:   {}", dem.target_crs);
    }
    println!("  Output:         {}", dem.processed_dir.display());
    println!();
}
