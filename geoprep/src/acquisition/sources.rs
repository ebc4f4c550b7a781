//! Fixed boundary datasets fetched alongside the elevation tiles.

use std::path::Path;

use crate::fetch::FetchTarget;

/// A vector dataset published as a zipped shapefile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryDataset {
    /// Archive stem; also the name of the extracted directory and shapefile.
    pub key: &'static str,
    /// Human-readable description.
    pub title: &'static str,
    /// Download URL.
    pub url: &'static str,
}

impl BoundaryDataset {
    /// Archive file name.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.key)
    }
}

/// Natural Earth 1:10m layers used for the base map.
pub const NATURAL_EARTH_DATASETS: &[BoundaryDataset] = &[
    BoundaryDataset {
        key: "ne_10m_admin_0_countries",
        title: "Country boundaries (1:10m)",
        url: "https://naciscdn.org/naturalearth/10m/cultural/ne_10m_admin_0_countries.zip",
    },
    BoundaryDataset {
        key: "ne_10m_admin_1_states_provinces",
        title: "First-level administrative divisions (1:10m)",
        url: "https://naciscdn.org/naturalearth/10m/cultural/ne_10m_admin_1_states_provinces.zip",
    },
    BoundaryDataset {
        key: "ne_10m_populated_places",
        title: "Populated places (1:10m)",
        url: "https://naciscdn.org/naturalearth/10m/cultural/ne_10m_populated_places.zip",
    },
    BoundaryDataset {
        key: "ne_10m_rivers_lake_centerlines",
        title: "Rivers and lake centerlines (1:10m)",
        url: "https://naciscdn.org/naturalearth/10m/physical/ne_10m_rivers_lake_centerlines.zip",
    },
];

/// Fetch targets for `datasets`, stored as archives under `dir`.
pub fn boundary_targets(datasets: &[BoundaryDataset], dir: &Path) -> Vec<FetchTarget> {
    datasets
        .iter()
        .map(|d| FetchTarget::new(d.key, d.url, dir.join(d.archive_name())))
        .collect()
}
