//! `processing_summary.json` written after an elevation run.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use super::dem::{DemGraphConfig, GEOGRAPHIC_CRS};
use super::{RunReport, StageOutcome};
use crate::toolchain::RasterStatistics;

/// Elevation data source named in summaries.
pub const DEM_SOURCE: &str = "JAXA AW3D30";

/// A named point of interest inside the processed region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl KeyLocation {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// Campaign sites recorded in every summary.
pub fn default_key_locations() -> Vec<KeyLocation> {
    vec![
        KeyLocation::new("Moscow", 55.7558, 37.6173),
        KeyLocation::new("Smolensk", 54.7818, 32.0401),
        KeyLocation::new("Borodino", 55.5167, 35.8167),
        KeyLocation::new("Vilnius", 54.6872, 25.2797),
        KeyLocation::new("Berezina", 54.3667, 28.0167),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRegion {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStage {
    pub name: String,
    pub required: bool,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Description of a processing run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
    pub project: String,
    pub generated_at: String,
    pub source: String,
    pub region: SummaryRegion,
    pub resolution_deg: f64,
    pub coordinate_system: String,
    pub status: String,
    /// Output file names of succeeded stages.
    pub outputs: BTreeMap<String, String>,
    pub stages: Vec<SummaryStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<RasterStatistics>,
    pub key_locations: Vec<KeyLocation>,
}

impl ProcessingSummary {
    /// Summarize `report` produced from `config`.
    pub fn from_report(config: &DemGraphConfig, report: &RunReport) -> Self {
        let outputs = report
            .results
            .iter()
            .filter_map(|r| {
                let output = r.output.as_ref()?;
                let file = output.file_name()?.to_string_lossy().into_owned();
                Some((r.name.clone(), file))
            })
            .collect();

        let stages = report
            .results
            .iter()
            .map(|r| SummaryStage {
                name: r.name.clone(),
                required: r.required,
                outcome: r.outcome.label().to_string(),
                detail: match &r.outcome {
                    StageOutcome::Failed { diagnostic } => Some(diagnostic.clone()),
                    StageOutcome::SkippedDependencyFailed { dependency } => {
                        Some(format!("dependency '{}' did not succeed", dependency))
                    }
                    _ => None,
                },
            })
            .collect();

        Self {
            project: "Napoleon 1812 Campaign - DEM Processing".to_string(),
            generated_at: Local::now().to_rfc3339(),
            source: DEM_SOURCE.to_string(),
            region: SummaryRegion {
                west: config.region.west,
                south: config.region.south,
                east: config.region.east,
                north: config.region.north,
            },
            resolution_deg: config.resolution,
            coordinate_system: format!("WGS84 ({})", GEOGRAPHIC_CRS),
            status: report.status().to_string(),
            outputs,
            stages,
            statistics: None,
            key_locations: default_key_locations(),
        }
    }

    /// Attach statistics of the cropped raster.
    pub fn with_statistics(mut self, statistics: RasterStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Write pretty-printed JSON to `path`.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}
