//! Fetch command - download elevation tiles or boundary datasets.

use console::style;
use geoprep::acquisition::{
    boundary_targets, AcquisitionOrchestrator, AcquisitionPlan, AcquisitionSummary,
    EventCallback, NATURAL_EARTH_DATASETS,
};
use geoprep::fetch::{FetchTarget, Fetcher};
use indicatif::HumanBytes;
use tracing::info;

use super::common::{confirm, heading, parse_tile_ids, print_ids, RetryMode};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui::AcquisitionProgress;

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub plan: bool,
    pub yes: bool,
    pub parallel: Option<usize>,
    pub only: Vec<String>,
    pub from: Option<usize>,
    pub force: bool,
    pub boundaries: bool,
    pub retry: Option<RetryMode>,
}

/// Run the fetch command.
///
/// Exits 0 when every target ended downloaded or skipped, 1 otherwise.
pub fn run(runner: &CliRunner, args: FetchArgs) -> Result<i32, CliError> {
    runner.log_startup("fetch");
    let config = runner.config();

    let targets = if args.boundaries {
        boundary_targets(NATURAL_EARTH_DATASETS, &runner.layout().boundaries_dir())
    } else {
        let grid = config.tile_grid()?;
        let tiles = if !args.only.is_empty() {
            grid.select(&parse_tile_ids(&args.only)?)
        } else if let Some(index) = args.from {
            grid.tiles_from(index)
        } else {
            grid.tiles()
        };
        tiles.iter().map(FetchTarget::from).collect()
    };

    let mut acquisition = config.acquisition_config();
    if let Some(parallel) = args.parallel {
        acquisition = acquisition.with_parallel(parallel);
    }
    if args.force {
        let options = acquisition.options.clone().with_skip_if_exists(false);
        acquisition = acquisition.with_options(options);
    }
    if args.boundaries {
        acquisition = acquisition.with_estimated_item_bytes(0);
    }

    let cancel = runner.cancel_on_interrupt()?;
    let orchestrator =
        AcquisitionOrchestrator::new(Fetcher::http()?, acquisition).with_cancel(cancel);

    let plan = orchestrator.plan(&targets);
    print_plan(&plan, args.boundaries);

    if args.plan || plan.is_empty() {
        if plan.is_empty() {
            println!("Nothing to download.");
        }
        return Ok(0);
    }

    if !confirm(&format!("Download {} item(s)?", plan.pending()), args.yes)? {
        println!("Aborted.");
        return Ok(0);
    }

    let progress = AcquisitionProgress::new(targets.len());
    let on_event: &EventCallback<'_> = &|event| progress.handle(event);
    let mut summary = orchestrator.execute(&targets, Some(on_event));
    progress.finish();

    if let Some(mode) = args.retry {
        if summary.failed() > 0 && !summary.cancelled {
            info!(failed = summary.failed(), "Retrying failed downloads");
            println!("Retrying {} failed item(s)...", summary.failed());

            let retry_progress = AcquisitionProgress::new(summary.failed());
            let on_retry: &EventCallback<'_> = &|event| retry_progress.handle(event);
            let retry = orchestrator.retry_failed(&summary, &targets, mode.into(), Some(on_retry));
            retry_progress.finish();
            summary.merge_retry(retry);
        }
    }

    print_summary(&summary);
    Ok(if summary.is_complete() { 0 } else { 1 })
}

fn print_plan(plan: &AcquisitionPlan, boundaries: bool) {
    heading(if boundaries {
        "Boundary datasets"
    } else {
        "Elevation tiles"
    });
    println!("  Total:    {}", plan.total);
    println!("  Existing: {}", plan.existing);
    println!("  Pending:  {}", plan.pending());
    if plan.estimated_bytes > 0 {
        println!("  Estimated download: {}", HumanBytes(plan.estimated_bytes));
    }
    println!();
}

fn print_summary(summary: &AcquisitionSummary) {
    println!();
    heading("Download summary");
    println!(
        "  {} downloaded, {} skipped, {} failed ({})",
        summary.downloaded(),
        summary.skipped(),
        summary.failed(),
        HumanBytes(summary.bytes())
    );

    for result in summary.results.iter().filter(|r| r.outcome.is_failure()) {
        println!("  {} {}: {}", style("✗").red(), result.id, result.outcome);
    }
    print_ids("Not attempted", &summary.not_attempted);

    if summary.cancelled {
        println!("{}", style("Download was interrupted.").yellow());
    } else if summary.is_complete() {
        println!("{}", style("All items present.").green());
    }
}
