//! Executes a validated stage list.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    output_exists, partial_output_path, validate_graph, GraphError, RunReport, StageOutcome,
    StageResult, StageSpec,
};
use crate::cancel::CancelFlag;
use crate::toolchain::ToolRunner;

/// Progress notifications emitted while a graph runs.
#[derive(Debug, Clone)]
pub enum StageEvent {
    /// A stage is about to invoke its tool.
    Started { name: String, command: String },
    /// A stage reached a terminal state.
    Finished { result: StageResult },
}

/// Callback receiving [`StageEvent`]s.
pub type StageEventCallback<'a> = dyn Fn(&StageEvent) + Send + Sync + 'a;

/// Runs stage graphs through a [`ToolRunner`].
pub struct StageGraphRunner {
    runner: Arc<dyn ToolRunner>,
    reuse_existing: bool,
    cancel: CancelFlag,
}

impl StageGraphRunner {
    /// Create a runner that reuses existing outputs.
    pub fn new(runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            runner,
            reuse_existing: true,
            cancel: CancelFlag::new(),
        }
    }

    /// Whether an existing non-empty output counts as success without
    /// running the tool.
    pub fn with_reuse_existing(mut self, reuse: bool) -> Self {
        self.reuse_existing = reuse;
        self
    }

    /// Stop starting new stages once `cancel` is set.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run `stages` in order.
    pub fn run(&self, stages: &[StageSpec]) -> Result<RunReport, GraphError> {
        self.run_with_events(stages, None)
    }

    /// Run `stages` in order, reporting progress to `on_event`.
    ///
    /// Returns an error only for a malformed graph; stage failures are
    /// recorded in the report.
    pub fn run_with_events(
        &self,
        stages: &[StageSpec],
        on_event: Option<&StageEventCallback<'_>>,
    ) -> Result<RunReport, GraphError> {
        validate_graph(stages)?;

        let mut report = RunReport::default();
        let mut outcomes: HashMap<&str, bool> = HashMap::new();

        for stage in stages {
            let outcome = if self.cancel.is_cancelled() {
                report.cancelled = true;
                StageOutcome::Cancelled
            } else if let Some(dependency) = stage
                .depends_on
                .iter()
                .find(|d| !outcomes.get(d.as_str()).copied().unwrap_or(false))
            {
                debug!(stage = %stage.name, dependency = %dependency, "Skipping stage");
                StageOutcome::SkippedDependencyFailed {
                    dependency: dependency.clone(),
                }
            } else if self.reuse_existing && output_exists(&stage.output) {
                debug!(stage = %stage.name, output = %stage.output.display(), "Reusing existing output");
                StageOutcome::Succeeded { reused: true }
            } else {
                if let Some(callback) = on_event {
                    callback(&StageEvent::Started {
                        name: stage.name.clone(),
                        command: stage.invocation.to_string(),
                    });
                }
                report.invocations += 1;
                self.execute(stage)
            };

            match &outcome {
                StageOutcome::Failed { diagnostic } if stage.required => {
                    warn!(stage = %stage.name, diagnostic = %diagnostic, "Required stage failed");
                }
                StageOutcome::Failed { diagnostic } => {
                    warn!(stage = %stage.name, diagnostic = %diagnostic, "Stage failed");
                }
                StageOutcome::Succeeded { reused: false } => {
                    info!(stage = %stage.name, output = %stage.output.display(), "Stage succeeded");
                }
                _ => {}
            }

            outcomes.insert(stage.name.as_str(), outcome.is_success());
            let result = StageResult {
                name: stage.name.clone(),
                required: stage.required,
                output: outcome.is_success().then(|| stage.output.clone()),
                outcome,
            };

            if let Some(callback) = on_event {
                callback(&StageEvent::Finished {
                    result: result.clone(),
                });
            }
            report.results.push(result);
        }

        Ok(report)
    }

    /// Invoke one stage and put its output in place.
    fn execute(&self, stage: &StageSpec) -> StageOutcome {
        if let Some(parent) = stage.output.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    return StageOutcome::Failed {
                        diagnostic: format!(
                            "cannot create output directory {}: {}",
                            parent.display(),
                            e
                        ),
                    };
                }
            }
        }

        let program = stage.invocation.program();

        if !stage.invocation.uses_output() {
            return match self.runner.invoke(program, &stage.invocation.args(None)) {
                Ok(output) if !output.success() => failed(output.into_result(program).err()),
                Ok(_) if output_exists(&stage.output) => StageOutcome::Succeeded { reused: false },
                Ok(_) => no_output(&stage.output),
                Err(e) => StageOutcome::Failed {
                    diagnostic: e.to_string(),
                },
            };
        }

        let partial = partial_output_path(&stage.output);
        // Leftover from an interrupted run
        let _ = remove_path(&partial);

        debug!(stage = %stage.name, partial = %partial.display(), "Invoking tool");
        let outcome = match self
            .runner
            .invoke(program, &stage.invocation.args(Some(&partial)))
        {
            Ok(output) if !output.success() => failed(output.into_result(program).err()),
            Ok(_) if !output_exists(&partial) => no_output(&stage.output),
            Ok(_) => match promote(&partial, &stage.output) {
                Ok(()) => StageOutcome::Succeeded { reused: false },
                Err(e) => StageOutcome::Failed {
                    diagnostic: format!("cannot move output into place: {}", e),
                },
            },
            Err(e) => StageOutcome::Failed {
                diagnostic: e.to_string(),
            },
        };

        if !outcome.is_success() {
            let _ = remove_path(&partial);
        }
        outcome
    }
}

fn failed(error: Option<crate::toolchain::ToolError>) -> StageOutcome {
    StageOutcome::Failed {
        diagnostic: error.map(|e| e.to_string()).unwrap_or_default(),
    }
}

fn no_output(output: &Path) -> StageOutcome {
    StageOutcome::Failed {
        diagnostic: format!("tool reported success but produced no output at {}", output.display()),
    }
}

/// Replace `output` with `partial`.
fn promote(partial: &Path, output: &Path) -> io::Result<()> {
    if output.exists() {
        remove_path(output)?;
    }
    fs::rename(partial, output)
}

fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
