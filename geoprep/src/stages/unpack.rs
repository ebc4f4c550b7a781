//! Archive extraction graph.
//!
//! Each archive `<dir>/<name>.zip` is extracted into `<dir>/<name>/`; the
//! extraction directory is the stage output, so an archive that was already
//! unpacked is not touched again.

use std::path::{Path, PathBuf};

use glob::glob;
use tracing::warn;

use super::StageSpec;
use crate::toolchain::{ToolInvocation, UNZIP_TOOL};

/// Prefix of unpack stage names.
pub const UNPACK_PREFIX: &str = "unpack:";

/// Directory an archive is extracted into.
pub fn extraction_dir(archive: &Path) -> PathBuf {
    archive.with_extension("")
}

/// Zip archives directly inside `dir`, sorted by path.
pub fn find_archives(dir: &Path) -> Vec<PathBuf> {
    let pattern = dir.join("*.zip");
    let pattern = pattern.to_string_lossy();

    let mut archives: Vec<PathBuf> = match glob(&pattern) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect(),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid archive pattern");
            Vec::new()
        }
    };
    archives.sort();
    archives
}

/// One independent optional extraction stage per archive.
pub fn build_unpack_graph(archives: &[PathBuf]) -> Vec<StageSpec> {
    archives
        .iter()
        .map(|archive| {
            let name = archive
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            StageSpec::new(
                format!("{}{}", UNPACK_PREFIX, name),
                ToolInvocation::new(UNZIP_TOOL)
                    .flag("-o")
                    .flag("-q")
                    .output_option("-d")
                    .input(archive),
                extraction_dir(archive),
            )
            .with_inputs([archive.clone()])
        })
        .collect()
}
