//! Artifact set inspection and readiness verdict.
//!
//! Each artifact in a [`Manifest`] is checked independently and recorded as
//! present-valid, present-invalid or missing. Problems with required
//! artifacts make the set not ready; problems with optional artifacts only
//! warn, whether the artifact is missing or malformed.

mod geojson;
mod manifest;

pub use geojson::{check_document, GeometryRule};
pub use manifest::{Manifest, ManifestError};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What kind of artifact a path holds and how to check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactKind {
    /// GeoJSON document with structural checks.
    #[serde(rename = "geojson")]
    GeoJson {
        #[serde(default)]
        geometry: GeometryRule,
        /// Properties every feature must carry with a non-empty value.
        #[serde(default)]
        required_keys: Vec<String>,
    },
    /// Any non-empty file.
    File,
    /// Directory holding a `.shp` with its `.shx` and `.dbf` siblings.
    Shapefile,
    /// Directory holding at least one GeoTIFF, at any depth.
    RasterTiles,
}

impl ArtifactKind {
    /// GeoJSON with any geometry and no required properties.
    pub fn geojson() -> Self {
        Self::GeoJson {
            geometry: GeometryRule::Any,
            required_keys: Vec::new(),
        }
    }

    /// GeoJSON of points carrying `keys`.
    pub fn point_geojson(keys: &[&str]) -> Self {
        Self::GeoJson {
            geometry: GeometryRule::Point,
            required_keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// One artifact to check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub required: bool,
    pub kind: ArtifactKind,
}

impl ArtifactSpec {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            required: false,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Result of checking one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOutcome {
    PresentValid,
    PresentInvalid,
    Missing,
}

impl fmt::Display for ArtifactOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PresentValid => write!(f, "present-valid"),
            Self::PresentInvalid => write!(f, "present-invalid"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// Outcome and diagnostic detail for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRecord {
    pub name: String,
    pub required: bool,
    pub outcome: ArtifactOutcome,
    pub detail: String,
}

impl ValidationRecord {
    pub fn is_valid(&self) -> bool {
        self.outcome == ArtifactOutcome::PresentValid
    }
}

/// Aggregate judgment over an artifact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Every artifact is present and valid.
    Ready,
    /// Required artifacts are fine, some optional ones are not.
    Partial,
    /// At least one required artifact is missing or invalid.
    NotReady,
}

impl Readiness {
    /// Process exit status for the verdict.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Ready => 0,
            Self::Partial => 1,
            Self::NotReady => 2,
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Partial => write!(f, "partial"),
            Self::NotReady => write!(f, "not ready"),
        }
    }
}

/// Records of one validation pass, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub records: Vec<ValidationRecord>,
}

impl ValidationReport {
    /// Present-valid artifacts.
    pub fn passed(&self) -> Vec<&ValidationRecord> {
        self.records.iter().filter(|r| r.is_valid()).collect()
    }

    /// Required artifacts that are missing or invalid.
    pub fn failed(&self) -> Vec<&ValidationRecord> {
        self.records
            .iter()
            .filter(|r| r.required && !r.is_valid())
            .collect()
    }

    /// Optional artifacts that are missing or invalid.
    pub fn warned(&self) -> Vec<&ValidationRecord> {
        self.records
            .iter()
            .filter(|r| !r.required && !r.is_valid())
            .collect()
    }

    pub fn readiness(&self) -> Readiness {
        if !self.failed().is_empty() {
            Readiness::NotReady
        } else if !self.warned().is_empty() {
            Readiness::Partial
        } else {
            Readiness::Ready
        }
    }

    pub fn record(&self, name: &str) -> Option<&ValidationRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

/// Check every artifact in `manifest`.
pub fn validate(manifest: &Manifest) -> ValidationReport {
    let records = manifest
        .artifacts
        .iter()
        .map(|spec| {
            let record = check_artifact(spec);
            match (record.outcome, record.required) {
                (ArtifactOutcome::PresentValid, _) => {
                    debug!(artifact = %record.name, detail = %record.detail, "Artifact valid")
                }
                (_, true) => {
                    warn!(artifact = %record.name, outcome = %record.outcome, detail = %record.detail, "Required artifact not usable")
                }
                (_, false) => {
                    debug!(artifact = %record.name, outcome = %record.outcome, detail = %record.detail, "Optional artifact not usable")
                }
            }
            record
        })
        .collect();

    ValidationReport { records }
}

/// Check a single artifact.
pub fn check_artifact(spec: &ArtifactSpec) -> ValidationRecord {
    let (outcome, detail) = match &spec.kind {
        ArtifactKind::GeoJson {
            geometry,
            required_keys,
        } => check_geojson_file(&spec.path, *geometry, required_keys),
        ArtifactKind::File => check_file(&spec.path),
        ArtifactKind::Shapefile => check_shapefile(&spec.path),
        ArtifactKind::RasterTiles => check_raster_tiles(&spec.path),
    };

    ValidationRecord {
        name: spec.name.clone(),
        required: spec.required,
        outcome,
        detail,
    }
}

fn megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn missing(path: &Path) -> (ArtifactOutcome, String) {
    (
        ArtifactOutcome::Missing,
        format!("not found: {}", path.display()),
    )
}

fn invalid(detail: impl Into<String>) -> (ArtifactOutcome, String) {
    (ArtifactOutcome::PresentInvalid, detail.into())
}

fn check_geojson_file(
    path: &Path,
    geometry: GeometryRule,
    required_keys: &[String],
) -> (ArtifactOutcome, String) {
    if !path.is_file() {
        return missing(path);
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return invalid(format!("cannot read: {}", e)),
    };
    let doc: serde_json::Value = match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(e) => return invalid(format!("invalid JSON: {}", e)),
    };

    match check_document(&doc, geometry, required_keys) {
        Ok(count) => (
            ArtifactOutcome::PresentValid,
            format!("{} features, {}", count, megabytes(text.len() as u64)),
        ),
        Err(e) => invalid(e),
    }
}

fn check_file(path: &Path) -> (ArtifactOutcome, String) {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {
            (ArtifactOutcome::PresentValid, megabytes(meta.len()))
        }
        Ok(meta) if meta.is_file() => invalid("file is empty"),
        Ok(_) => invalid("not a regular file"),
        Err(_) => missing(path),
    }
}

fn glob_files(pattern: &Path) -> Vec<PathBuf> {
    match glob(&pattern.to_string_lossy()) {
        Ok(paths) => paths.filter_map(Result::ok).filter(|p| p.is_file()).collect(),
        Err(_) => Vec::new(),
    }
}

fn total_size(files: &[PathBuf]) -> u64 {
    files
        .iter()
        .filter_map(|f| fs::metadata(f).ok())
        .map(|m| m.len())
        .sum()
}

fn check_shapefile(dir: &Path) -> (ArtifactOutcome, String) {
    if !dir.is_dir() {
        return missing(dir);
    }

    let mut shapefiles = glob_files(&dir.join("*.shp"));
    shapefiles.sort();
    let Some(shp) = shapefiles.first() else {
        return invalid("no .shp file");
    };

    let missing_siblings: Vec<&str> = ["shx", "dbf"]
        .into_iter()
        .filter(|ext| !shp.with_extension(ext).is_file())
        .collect();
    if !missing_siblings.is_empty() {
        return invalid(format!(
            "{} lacks .{}",
            shp.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
            missing_siblings.join(", .")
        ));
    }

    let files = glob_files(&dir.join("**").join("*"));
    (ArtifactOutcome::PresentValid, megabytes(total_size(&files)))
}

fn check_raster_tiles(dir: &Path) -> (ArtifactOutcome, String) {
    if !dir.is_dir() {
        return missing(dir);
    }

    let rasters = glob_files(&dir.join("**").join("*.tif"));
    if rasters.is_empty() {
        return invalid("no GeoTIFF files");
    }

    let archives = glob_files(&dir.join("*.zip"));
    let mut detail = format!("{} GeoTIFF files", rasters.len());
    if !archives.is_empty() {
        detail.push_str(&format!(", {} archives", archives.len()));
    }
    detail.push_str(&format!(" ({})", megabytes(total_size(&rasters))));

    (ArtifactOutcome::PresentValid, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID_EVENTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [37.6173, 55.7558]},
            "properties": {"id": "moscow_entry", "date": "1812-09-14"}
        }]
    }"#;

    const NULL_COORDINATE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [37.6173, null]},
            "properties": {"id": "moscow_entry", "date": "1812-09-14"}
        }]
    }"#;

    fn events_spec(path: PathBuf) -> ArtifactSpec {
        ArtifactSpec::new("events", path, ArtifactKind::point_geojson(&["id", "date"])).required()
    }

    #[test]
    fn test_valid_events() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.geojson");
        fs::write(&path, VALID_EVENTS).unwrap();

        let record = check_artifact(&events_spec(path));
        assert_eq!(record.outcome, ArtifactOutcome::PresentValid);
        assert!(record.detail.starts_with("1 features"));
    }

    #[test]
    fn test_null_coordinate_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.geojson");
        fs::write(&path, NULL_COORDINATE).unwrap();

        let record = check_artifact(&events_spec(path));
        assert_eq!(record.outcome, ArtifactOutcome::PresentInvalid);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let record = check_artifact(&events_spec(dir.path().join("events.geojson")));
        assert_eq!(record.outcome, ArtifactOutcome::Missing);
        assert!(record.detail.contains("events.geojson"));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.geojson");
        fs::write(&path, "{ not json").unwrap();

        let record = check_artifact(&events_spec(path));
        assert_eq!(record.outcome, ArtifactOutcome::PresentInvalid);
        assert!(record.detail.starts_with("invalid JSON"));
    }

    #[test]
    fn test_file_kind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hillshade.tif");
        let spec = ArtifactSpec::new("hillshade", &path, ArtifactKind::File);

        assert_eq!(check_artifact(&spec).outcome, ArtifactOutcome::Missing);
        fs::write(&path, b"").unwrap();
        assert_eq!(check_artifact(&spec).outcome, ArtifactOutcome::PresentInvalid);
        fs::write(&path, b"II*").unwrap();
        assert_eq!(check_artifact(&spec).outcome, ArtifactOutcome::PresentValid);
    }

    #[test]
    fn test_shapefile_kind() {
        let dir = TempDir::new().unwrap();
        let shp_dir = dir.path().join("ne_10m_admin_0_countries");
        let spec = ArtifactSpec::new("countries", &shp_dir, ArtifactKind::Shapefile);

        assert_eq!(check_artifact(&spec).outcome, ArtifactOutcome::Missing);

        fs::create_dir(&shp_dir).unwrap();
        assert_eq!(check_artifact(&spec).outcome, ArtifactOutcome::PresentInvalid);

        fs::write(shp_dir.join("ne_10m_admin_0_countries.shp"), b"shp").unwrap();
        let record = check_artifact(&spec);
        assert_eq!(record.outcome, ArtifactOutcome::PresentInvalid);
        assert!(record.detail.contains(".shx, .dbf"));

        fs::write(shp_dir.join("ne_10m_admin_0_countries.shx"), b"shx").unwrap();
        fs::write(shp_dir.join("ne_10m_admin_0_countries.dbf"), b"dbf").unwrap();
        assert_eq!(check_artifact(&spec).outcome, ArtifactOutcome::PresentValid);
    }

    #[test]
    fn test_raster_tiles_kind() {
        let dir = TempDir::new().unwrap();
        let tiles = dir.path().join("jaxa_aw3d30");
        let spec = ArtifactSpec::new("dem tiles", &tiles, ArtifactKind::RasterTiles);

        fs::create_dir_all(tiles.join("N050E020_N055E025")).unwrap();
        fs::write(tiles.join("N050E020_N055E025.zip"), b"zip").unwrap();
        assert_eq!(check_artifact(&spec).outcome, ArtifactOutcome::PresentInvalid);

        fs::write(tiles.join("N050E020_N055E025").join("a_DSM.tif"), b"tif").unwrap();
        let record = check_artifact(&spec);
        assert_eq!(record.outcome, ArtifactOutcome::PresentValid);
        assert!(record.detail.starts_with("1 GeoTIFF files, 1 archives"));
    }

    #[test]
    fn test_readiness() {
        let dir = TempDir::new().unwrap();
        let events = dir.path().join("events.geojson");
        fs::write(&events, VALID_EVENTS).unwrap();
        let optional = ArtifactSpec::new(
            "territories",
            dir.path().join("territories.geojson"),
            ArtifactKind::geojson(),
        );

        let ready = validate(&Manifest::new(vec![events_spec(events.clone())]));
        assert_eq!(ready.readiness(), Readiness::Ready);
        assert_eq!(ready.readiness().exit_code(), 0);

        let partial = validate(&Manifest::new(vec![
            events_spec(events.clone()),
            optional.clone(),
        ]));
        assert_eq!(partial.readiness(), Readiness::Partial);
        assert_eq!(partial.warned().len(), 1);
        assert_eq!(partial.passed().len(), 1);

        let not_ready = validate(&Manifest::new(vec![
            events_spec(dir.path().join("missing.geojson")),
            optional,
        ]));
        assert_eq!(not_ready.readiness(), Readiness::NotReady);
        assert_eq!(not_ready.readiness().exit_code(), 2);
        assert_eq!(not_ready.failed()[0].name, "events");
    }

    #[test]
    fn test_missing_and_invalid_optional_warn_equally() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.geojson");
        fs::write(&broken, "[]").unwrap();

        let report = validate(&Manifest::new(vec![
            ArtifactSpec::new("absent", dir.path().join("absent.geojson"), ArtifactKind::geojson()),
            ArtifactSpec::new("broken", &broken, ArtifactKind::geojson()),
        ]));

        assert_eq!(report.warned().len(), 2);
        assert_eq!(report.readiness(), Readiness::Partial);
    }
}
