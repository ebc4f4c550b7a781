//! Dependent processing stages.
//!
//! A stage is one toolchain call that turns input files into one output
//! path. Stages are given as an ordered list where every predecessor appears
//! before its dependents; the runner walks the list once:
//!
//! ```text
//! pending ──► running ──► succeeded
//!    │                └──► failed
//!    └──► skipped-dependency-failed   (a predecessor did not succeed)
//! ```
//!
//! An existing output counts as success without running the tool, so a
//! repeated run only does the work that is still missing. Failure of one
//! branch never stops stages that do not depend on it.
//!
//! Graph builders for the concrete pipelines live in the submodules:
//! - [`dem`] - merge → crop → {contour, hillshade, heightmap, reproject}
//! - [`vector`] - shapefile → GeoJSON conversions
//! - [`unpack`] - archive extraction

pub mod dem;
mod runner;
pub mod summary;
pub mod unpack;
pub mod vector;

pub use runner::{StageEvent, StageEventCallback, StageGraphRunner};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::toolchain::ToolInvocation;

/// Structural problems in a stage list, detected before anything runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two stages share a name.
    #[error("duplicate stage name '{0}'")]
    DuplicateStage(String),

    /// A stage depends on a name that is not in the list.
    #[error("stage '{stage}' depends on unknown stage '{dependency}'")]
    UnknownDependency { stage: String, dependency: String },

    /// A stage depends on itself or on a stage listed after it.
    #[error("stage '{stage}' depends on '{dependency}', which is not listed before it")]
    DependencyOrder { stage: String, dependency: String },
}

/// One processing stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    /// Unique stage name.
    pub name: String,
    /// Stages that must succeed before this one runs.
    pub depends_on: Vec<String>,
    /// Input files (informational; also rendered into the invocation).
    pub inputs: Vec<PathBuf>,
    /// Output file or directory.
    pub output: PathBuf,
    /// Toolchain call producing the output.
    pub invocation: ToolInvocation,
    /// Whether the stage is essential to the run.
    pub required: bool,
}

impl StageSpec {
    /// Create an optional stage with no dependencies.
    pub fn new(
        name: impl Into<String>,
        invocation: ToolInvocation,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            inputs: Vec::new(),
            output: output.into(),
            invocation,
            required: false,
        }
    }

    /// Add a predecessor.
    pub fn after(mut self, stage: impl Into<String>) -> Self {
        self.depends_on.push(stage.into());
        self
    }

    /// Record the stage inputs.
    pub fn with_inputs<I, P>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    /// Mark the stage as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Terminal state of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The output exists; `reused` when it was already present.
    Succeeded { reused: bool },
    /// The tool failed or produced nothing.
    Failed { diagnostic: String },
    /// A predecessor did not succeed, so the tool was never run.
    SkippedDependencyFailed { dependency: String },
    /// The run was cancelled before this stage started.
    Cancelled,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded { reused: false } => "succeeded",
            Self::Succeeded { reused: true } => "succeeded (existing)",
            Self::Failed { .. } => "failed",
            Self::SkippedDependencyFailed { .. } => "skipped-dependency-failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { diagnostic } if !diagnostic.is_empty() => {
                write!(f, "failed: {}", diagnostic)
            }
            Self::SkippedDependencyFailed { dependency } => {
                write!(f, "skipped-dependency-failed ({})", dependency)
            }
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Result of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub name: String,
    pub required: bool,
    pub outcome: StageOutcome,
    /// Output path, present when the stage succeeded.
    pub output: Option<PathBuf>,
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every stage succeeded.
    Succeeded,
    /// Some stages succeeded, others did not.
    PartiallyFailed,
    /// No stage succeeded.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::PartiallyFailed => write!(f, "partially failed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Results of one run, in stage order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub results: Vec<StageResult>,
    /// Number of toolchain calls made.
    pub invocations: usize,
    /// Whether the run was cancelled before finishing.
    pub cancelled: bool,
}

impl RunReport {
    /// Aggregate status over all results.
    pub fn status(&self) -> RunStatus {
        let succeeded = self
            .results
            .iter()
            .filter(|r| r.outcome.is_success())
            .count();

        if succeeded == self.results.len() {
            RunStatus::Succeeded
        } else if succeeded == 0 {
            RunStatus::Failed
        } else {
            RunStatus::PartiallyFailed
        }
    }

    /// Look up the result of a stage by name.
    pub fn result(&self, name: &str) -> Option<&StageResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Outcome of a stage by name.
    pub fn outcome(&self, name: &str) -> Option<&StageOutcome> {
        self.result(name).map(|r| &r.outcome)
    }

    fn names(&self, pred: impl Fn(&StageResult) -> bool) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| pred(r))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Names of stages that failed.
    pub fn failed(&self) -> Vec<String> {
        self.names(|r| matches!(r.outcome, StageOutcome::Failed { .. }))
    }

    /// Names of stages skipped because a predecessor did not succeed.
    pub fn skipped(&self) -> Vec<String> {
        self.names(|r| matches!(r.outcome, StageOutcome::SkippedDependencyFailed { .. }))
    }

    /// Names of required stages that did not succeed.
    pub fn required_failures(&self) -> Vec<String> {
        self.names(|r| r.required && !r.outcome.is_success())
    }

    /// Whether a required stage failed, which halts everything downstream.
    pub fn halted(&self) -> bool {
        !self.required_failures().is_empty()
    }

    /// Output paths of succeeded stages, by stage name.
    pub fn outputs(&self) -> HashMap<&str, &Path> {
        self.results
            .iter()
            .filter_map(|r| r.output.as_deref().map(|p| (r.name.as_str(), p)))
            .collect()
    }
}

/// Check names are unique and every predecessor is listed earlier.
pub fn validate_graph(stages: &[StageSpec]) -> Result<(), GraphError> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for (i, stage) in stages.iter().enumerate() {
        if positions.insert(stage.name.as_str(), i).is_some() {
            return Err(GraphError::DuplicateStage(stage.name.clone()));
        }
    }

    for (i, stage) in stages.iter().enumerate() {
        for dependency in &stage.depends_on {
            match positions.get(dependency.as_str()) {
                None => {
                    return Err(GraphError::UnknownDependency {
                        stage: stage.name.clone(),
                        dependency: dependency.clone(),
                    })
                }
                Some(&pos) if pos >= i => {
                    return Err(GraphError::DependencyOrder {
                        stage: stage.name.clone(),
                        dependency: dependency.clone(),
                    })
                }
                Some(_) => {}
            }
        }
    }

    Ok(())
}

/// Temporary sibling a stage writes to before its output is put in place.
///
/// `dem/hillshade.tif` → `dem/hillshade.partial.tif`; extensionless paths
/// (directories) get a `.partial` suffix. The extension is kept so tools
/// that infer formats from it behave the same.
pub fn partial_output_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match output.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };

    output.with_file_name(name)
}

/// Check whether an output path holds something usable.
///
/// Files must be non-empty; directories must have at least one entry.
pub fn output_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len() > 0,
        Ok(meta) if meta.is_dir() => std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false),
        _ => false,
    }
}
