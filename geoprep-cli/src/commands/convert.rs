//! Convert command - boundary shapefiles to GeoJSON.

use std::sync::Arc;

use console::style;
use geoprep::stages::unpack::{build_unpack_graph, find_archives};
use geoprep::stages::vector::{build_vector_graph, default_vector_layers};
use geoprep::stages::{StageEventCallback, StageGraphRunner};
use geoprep::toolchain::ToolRunner;
use tracing::warn;

use super::common::{
    heading, print_ids, print_run_report, require_tools, required_programs, run_exit_code,
};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::StageProgress;

const OGR2OGR: &str = "ogr2ogr";

/// Arguments for the convert command.
pub struct ConvertArgs {
    pub force: bool,
}

/// Run the convert command.
pub fn run(runner: &CliRunner, args: ConvertArgs) -> Result<i32, CliError> {
    runner.log_startup("convert");
    let layout = runner.layout();
    let boundaries = layout.boundaries_dir();

    let archives = find_archives(&boundaries);

    let tools: Arc<dyn ToolRunner> = Arc::new(runner.config().tool_runner());
    require_tools(tools.as_ref(), &required_programs(&[OGR2OGR], &archives))?;

    let cancel = runner.cancel_on_interrupt()?;
    let progress = StageProgress::new();
    let on_event: &StageEventCallback<'_> = &|event| progress.handle(event);

    if !archives.is_empty() {
        let report = StageGraphRunner::new(Arc::clone(&tools))
            .with_cancel(cancel.clone())
            .run_with_events(&build_unpack_graph(&archives), Some(on_event))?;
        if !report.failed().is_empty() {
            warn!(failed = ?report.failed(), "Some boundary archives could not be extracted");
        }
    }

    let graph = build_vector_graph(&default_vector_layers(&boundaries, &layout.geojson_dir()));
    if graph.stages.is_empty() {
        progress.finish();
        eprintln!(
            "{} No boundary shapefiles found under {}",
            style("✗").red(),
            boundaries.display()
        );
        eprintln!("Run 'geoprep fetch --boundaries' first.");
        return Ok(2);
    }

    let report = StageGraphRunner::new(tools)
        .with_reuse_existing(!args.force)
        .with_cancel(cancel)
        .run_with_events(&graph.stages, Some(on_event))?;
    progress.finish();

    heading("Vector conversion");
    print_ids("Layers without a source shapefile", &graph.missing);
    print_run_report(&report);

    Ok(run_exit_code(&report))
}
