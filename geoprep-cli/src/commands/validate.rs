//! Validate command - check produced artifacts and report readiness.

use std::path::PathBuf;

use console::style;
use geoprep::validation::{validate, ArtifactOutcome, Manifest, Readiness, ValidationRecord};

use super::common::heading;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the validate command.
pub struct ValidateArgs {
    /// JSON manifest replacing the built-in artifact list.
    pub manifest: Option<PathBuf>,
}

/// Run the validate command.
///
/// Exits 0 when ready, 1 when only optional artifacts have problems and 2
/// when a required artifact is missing or invalid.
pub fn run(runner: &CliRunner, args: ValidateArgs) -> Result<i32, CliError> {
    runner.log_startup("validate");
    let layout = runner.layout();

    let manifest = match &args.manifest {
        Some(path) => Manifest::load(path, layout.data_dir())?,
        None => Manifest::default_for(&layout, &runner.config().dem_config()?),
    };

    let report = validate(&manifest);

    heading(format!("Validating {}", layout.data_dir().display()));
    for record in &report.records {
        print_record(record);
    }

    let readiness = report.readiness();
    let verdict = match readiness {
        Readiness::Ready => style(readiness.to_string()).green().bold(),
        Readiness::Partial => style(readiness.to_string()).yellow().bold(),
        Readiness::NotReady => style(readiness.to_string()).red().bold(),
    };

    println!();
    println!(
        "{} passed, {} warnings, {} failed: {}",
        report.passed().len(),
        report.warned().len(),
        report.failed().len(),
        verdict
    );

    Ok(readiness.exit_code())
}

fn print_record(record: &ValidationRecord) {
    let marker = match (&record.outcome, record.required) {
        (ArtifactOutcome::PresentValid, _) => style("✓").green(),
        (_, true) => style("✗").red(),
        (_, false) => style("!").yellow(),
    };
    let required = if record.required { "required" } else { "optional" };

    println!(
        "  {} {:<32} {:<8} {:<15} {}",
        marker,
        record.name,
        required,
        record.outcome.to_string(),
        record.detail
    );
}
