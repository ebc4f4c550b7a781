//! Common types and utilities shared across CLI commands.

use std::fmt::Display;
use std::path::PathBuf;

use clap::ValueEnum;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use geoprep::acquisition::RetryScope;
use geoprep::grid::TileId;
use geoprep::stages::{RunReport, RunStatus};
use geoprep::toolchain::{check_tools, ToolRunner, UNZIP_TOOL};

use crate::error::CliError;

/// Which failed downloads `--retry` covers.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RetryMode {
    /// Network and server errors only; tiles reported as absent are left alone
    Errors,
    /// Every failure, including tiles the server reported as absent
    All,
}

impl From<RetryMode> for RetryScope {
    fn from(mode: RetryMode) -> Self {
        match mode {
            RetryMode::Errors => RetryScope::Errors,
            RetryMode::All => RetryScope::AllFailures,
        }
    }
}

/// Ask a yes/no question; `assume_yes` answers without prompting.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, CliError> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(|e| CliError::Prompt(e.to_string()))
}

/// Parse `--only` identifiers.
pub fn parse_tile_ids(ids: &[String]) -> Result<Vec<TileId>, CliError> {
    ids.iter()
        .map(|id| id.parse::<TileId>().map_err(CliError::from))
        .collect()
}

/// Print a section title.
pub fn heading(title: impl Display) {
    println!("{}", style(title).bold().underlined());
}

/// Print a list of identifiers under a label, if any.
pub fn print_ids(label: &str, ids: &[String]) {
    if ids.is_empty() {
        return;
    }
    println!("{} ({}):", label, ids.len());
    for id in ids {
        println!("  - {}", id);
    }
}

/// Programs a run needs: `tools`, plus the extractor when there are archives.
pub fn required_programs<'a>(tools: &[&'a str], archives: &[PathBuf]) -> Vec<&'a str> {
    let mut programs = tools.to_vec();
    if !archives.is_empty() {
        programs.push(UNZIP_TOOL);
    }
    programs
}

/// Fail when any of `programs` is unusable.
pub fn require_tools(tools: &dyn ToolRunner, programs: &[&str]) -> Result<(), CliError> {
    let problems: Vec<String> = check_tools(tools, programs)
        .into_iter()
        .filter_map(|status| status.problem)
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(CliError::Toolchain(problems))
    }
}

/// Exit code for a stage run: 0 succeeded, 1 partially failed, 2 failed.
///
/// A failed required stage counts as failed even when earlier stages
/// succeeded.
pub fn run_exit_code(report: &RunReport) -> i32 {
    if report.halted() {
        return 2;
    }
    match report.status() {
        RunStatus::Succeeded => 0,
        RunStatus::PartiallyFailed => 1,
        RunStatus::Failed => 2,
    }
}

/// Print the closing lines of a stage run.
pub fn print_run_report(report: &RunReport) {
    let status = report.status();
    let styled = match status {
        RunStatus::Succeeded => style(status.to_string()).green(),
        RunStatus::PartiallyFailed => style(status.to_string()).yellow(),
        RunStatus::Failed => style(status.to_string()).red(),
    };

    println!();
    println!("Run {}: {} tool invocation(s)", styled, report.invocations);
    print_ids("Failed stages", &report.failed());
    print_ids("Skipped stages", &report.skipped());
    if report.cancelled {
        println!("{}", style("Run was interrupted; completed outputs were kept.").yellow());
    }
}
