//! Boundary to the external geospatial toolchain (GDAL/OGR, unzip).
//!
//! Every processing step is one executable call. [`ToolRunner`] runs it and
//! hands back the exit status and captured output; it never retries and
//! never interprets the result. Deciding what a non-zero exit means is the
//! stage runner's job.

mod invocation;
mod stats;

pub use invocation::{ToolInvocation, Value, OUTPUT_PLACEHOLDER};
pub use stats::{raster_statistics, RasterStatistics};

use std::io;
use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// GDAL/OGR executables the processing graphs rely on.
pub const GDAL_TOOLS: &[&str] = &[
    "gdalbuildvrt",
    "gdalinfo",
    "gdalwarp",
    "gdal_translate",
    "gdal_contour",
    "gdaldem",
    "ogr2ogr",
];

/// Archive extractor used for tile and boundary archives.
pub const UNZIP_TOOL: &str = "unzip";

/// Errors from running a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable could not be found.
    #[error("'{program}' not found. Install GDAL (e.g. 'apt install gdal-bin') or set [toolchain] bin_dir")]
    NotFound { program: String },

    /// The executable exists but could not be started.
    #[error("failed to start '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran and reported failure.
    #[error("'{program}' exited with {exit}: {diagnostic}")]
    Failed {
        program: String,
        exit: String,
        diagnostic: String,
    },
}

/// Captured result of one tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Check whether the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable exit status.
    pub fn exit_description(&self) -> String {
        match self.exit_code {
            Some(code) => format!("status {}", code),
            None => "a signal".to_string(),
        }
    }

    /// Diagnostic text: stderr if present, otherwise stdout.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }

    /// Convert a non-zero exit into [`ToolError::Failed`].
    pub fn into_result(self, program: &str) -> Result<ToolOutput, ToolError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ToolError::Failed {
                program: program.to_string(),
                exit: self.exit_description(),
                diagnostic: self.diagnostic(),
            })
        }
    }
}

/// Runs toolchain executables.
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args`, capturing exit status, stdout and stderr.
    fn invoke(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError>;
}

/// Runs tools as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessToolRunner {
    bin_dir: Option<PathBuf>,
}

impl ProcessToolRunner {
    /// Create a runner that resolves programs through `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve programs inside `bin_dir` instead of `PATH`.
    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(bin_dir.into());
        self
    }

    /// Path or name the program will be started with.
    pub fn resolve(&self, program: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(program),
            None => PathBuf::from(program),
        }
    }
}

impl ToolRunner for ProcessToolRunner {
    fn invoke(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        let executable = self.resolve(program);
        debug!(program = %executable.display(), args = ?args, "Running tool");

        let output = Command::new(&executable)
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        program: program.to_string(),
                    }
                } else {
                    ToolError::SpawnFailed {
                        program: program.to_string(),
                        source: e,
                    }
                }
            })?;

        let result = ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program, exit_code = ?result.exit_code, "Tool finished");

        Ok(result)
    }
}

/// Availability of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub program: String,
    /// First line of `--version` output when the tool ran successfully.
    pub version: Option<String>,
    /// Why the tool is unusable, when it is.
    pub problem: Option<String>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.problem.is_none()
    }
}

/// Check each program by running it with `--version`.
pub fn check_tools(runner: &dyn ToolRunner, programs: &[&str]) -> Vec<ToolStatus> {
    let version_args = ["--version".to_string()];

    programs
        .iter()
        .map(|program| match runner.invoke(program, &version_args) {
            Ok(output) if output.success() => ToolStatus {
                program: program.to_string(),
                version: output.stdout.lines().next().map(|l| l.trim().to_string()),
                problem: None,
            },
            Ok(output) => ToolStatus {
                program: program.to_string(),
                version: None,
                problem: Some(format!(
                    "'{}' --version exited with {}. Please ensure it is properly installed.",
                    program,
                    output.exit_description()
                )),
            },
            Err(e) => ToolStatus {
                program: program.to_string(),
                version: None,
                problem: Some(e.to_string()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeRunner {
        outputs: HashMap<String, ToolOutput>,
    }

    impl ToolRunner for FakeRunner {
        fn invoke(&self, program: &str, _args: &[String]) -> Result<ToolOutput, ToolError> {
            self.outputs
                .get(program)
                .cloned()
                .ok_or_else(|| ToolError::NotFound {
                    program: program.to_string(),
                })
        }
    }

    #[test]
    fn test_output_diagnostic_prefers_stderr() {
        let output = ToolOutput {
            exit_code: Some(1),
            stdout: "progress".to_string(),
            stderr: "ERROR 4: missing.tif: No such file\n".to_string(),
        };
        assert_eq!(output.diagnostic(), "ERROR 4: missing.tif: No such file");
        assert!(!output.success());
    }

    #[test]
    fn test_output_diagnostic_falls_back_to_stdout() {
        let output = ToolOutput {
            exit_code: Some(1),
            stdout: "usage: gdalwarp ...".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.diagnostic(), "usage: gdalwarp ...");
    }

    #[test]
    fn test_into_result() {
        let ok = ToolOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        assert!(ok.into_result("gdalinfo").is_ok());

        let signalled = ToolOutput {
            exit_code: None,
            ..Default::default()
        };
        let err = signalled.into_result("gdalwarp").unwrap_err();
        assert!(err.to_string().contains("a signal"));
    }

    #[test]
    fn test_resolve_with_bin_dir() {
        let runner = ProcessToolRunner::new().with_bin_dir("/opt/gdal/bin");
        assert_eq!(
            runner.resolve("gdalwarp"),
            PathBuf::from("/opt/gdal/bin/gdalwarp")
        );
        assert_eq!(
            ProcessToolRunner::new().resolve("gdalwarp"),
            PathBuf::from("gdalwarp")
        );
    }

    #[test]
    fn test_process_runner_missing_program() {
        let runner = ProcessToolRunner::new();
        let result = runner.invoke("nonexistent_tool_xyz", &[]);
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }

    #[test]
    fn test_check_tools() {
        let mut outputs = HashMap::new();
        outputs.insert(
            "gdalinfo".to_string(),
            ToolOutput {
                exit_code: Some(0),
                stdout: "GDAL 3.8.4, released 2024/02/08\n".to_string(),
                stderr: String::new(),
            },
        );
        outputs.insert(
            "gdalwarp".to_string(),
            ToolOutput {
                exit_code: Some(127),
                ..Default::default()
            },
        );
        let runner = FakeRunner { outputs };

        let statuses = check_tools(&runner, &["gdalinfo", "gdalwarp", "ogr2ogr"]);

        assert!(statuses[0].is_available());
        assert_eq!(
            statuses[0].version.as_deref(),
            Some("GDAL 3.8.4, released 2024/02/08")
        );
        assert!(!statuses[1].is_available());
        assert!(statuses[2].problem.as_ref().unwrap().contains("not found"));
    }
}
