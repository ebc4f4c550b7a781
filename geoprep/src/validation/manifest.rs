//! Artifact manifests: the built-in project manifest and JSON manifests.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ArtifactKind, ArtifactSpec};
use crate::acquisition::NATURAL_EARTH_DATASETS;
use crate::config::ProjectLayout;
use crate::stages::dem::DemGraphConfig;

/// Errors loading a manifest file.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest {0} lists no artifacts")]
    Empty(PathBuf),
}

/// The artifacts a validation pass checks, in report order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub artifacts: Vec<ArtifactSpec>,
}

impl Manifest {
    pub fn new(artifacts: Vec<ArtifactSpec>) -> Self {
        Self { artifacts }
    }

    /// Load a JSON manifest; relative artifact paths are resolved against
    /// `base_dir`.
    ///
    /// ```json
    /// {"artifacts": [{"name": "events", "path": "geojson/events.geojson",
    ///   "required": true,
    ///   "kind": {"type": "geojson", "geometry": "point", "required_keys": ["id", "date"]}}]}
    /// ```
    pub fn load(path: &Path, base_dir: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Manifest =
            serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if manifest.artifacts.is_empty() {
            return Err(ManifestError::Empty(path.to_path_buf()));
        }

        for artifact in &mut manifest.artifacts {
            if artifact.path.is_relative() {
                artifact.path = base_dir.join(&artifact.path);
            }
        }

        Ok(manifest)
    }

    /// Manifest of the standard project layout.
    ///
    /// Events, countries, cities and rivers are required; everything else
    /// only affects the verdict as a warning.
    pub fn default_for(layout: &ProjectLayout, dem: &DemGraphConfig) -> Self {
        let geojson = layout.geojson_dir();
        let any = ArtifactKind::geojson;

        let mut artifacts = vec![
            ArtifactSpec::new(
                "events",
                geojson.join("events.geojson"),
                ArtifactKind::point_geojson(&["id", "date"]),
            )
            .required(),
            ArtifactSpec::new("countries", geojson.join("countries.geojson"), any()).required(),
            ArtifactSpec::new("provinces", geojson.join("provinces.geojson"), any()),
            ArtifactSpec::new(
                "cities",
                geojson.join("cities.geojson"),
                ArtifactKind::point_geojson(&[]),
            )
            .required(),
            ArtifactSpec::new("rivers", geojson.join("rivers.geojson"), any()).required(),
            ArtifactSpec::new("movements", geojson.join("movements.geojson"), any()),
            ArtifactSpec::new("territories", geojson.join("territories.geojson"), any()),
            ArtifactSpec::new(
                "cities_major",
                geojson.join("cities_major.geojson"),
                ArtifactKind::point_geojson(&[]),
            ),
            ArtifactSpec::new(
                "cities_1812_campaign",
                geojson.join("cities_1812_campaign.geojson"),
                ArtifactKind::point_geojson(&[]),
            ),
            ArtifactSpec::new(
                "countries_eastern_europe",
                geojson.join("countries_eastern_europe.geojson"),
                any(),
            ),
        ];

        artifacts.extend(NATURAL_EARTH_DATASETS.iter().map(|dataset| {
            ArtifactSpec::new(
                format!("{} shapefile", dataset.key),
                layout.boundaries_dir().join(dataset.key),
                ArtifactKind::Shapefile,
            )
        }));

        artifacts.extend([
            ArtifactSpec::new("dem tiles", layout.dem_tiles_dir(), ArtifactKind::RasterTiles),
            ArtifactSpec::new("cropped dem", dem.cropped_path(), ArtifactKind::File),
            ArtifactSpec::new("hillshade", dem.hillshade_path(), ArtifactKind::File),
            ArtifactSpec::new("heightmap", dem.heightmap_path(), ArtifactKind::File),
            ArtifactSpec::new("contours", dem.contours_path(), any()),
            ArtifactSpec::new(
                "minard map",
                layout.maps_dir().join("Minard.png"),
                ArtifactKind::File,
            ),
        ]);

        Self { artifacts }
    }

    pub fn required_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.required).count()
    }
}
