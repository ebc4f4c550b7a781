//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. The
//! conversion methods on [`ConfigFile`] turn them into the runtime
//! configuration of the library components.

use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;
use super::layout::ProjectLayout;
use crate::acquisition::AcquisitionConfig;
use crate::fetch::{FetchOptions, DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_SECS};
use crate::grid::{
    GridError, Region, TileGrid, DEFAULT_ARCHIVE_EXTENSION, DEFAULT_BASE_URL, DEFAULT_TILE_SIZE,
};
use crate::stages::dem::{DemGraphConfig, HillshadeParams};
use crate::toolchain::ProcessToolRunner;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub paths: PathsSettings,
    pub region: RegionSettings,
    pub acquisition: AcquisitionSettings,
    pub processing: ProcessingSettings,
    pub toolchain: ToolchainSettings,
    pub logging: LoggingSettings,
}

/// Where project data lives.
#[derive(Debug, Clone, PartialEq)]
pub struct PathsSettings {
    pub data_dir: PathBuf,
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// Area of interest and tile granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSettings {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    /// Tile edge length in whole degrees.
    pub tile_size: u32,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            west: DEFAULT_WEST,
            south: DEFAULT_SOUTH,
            east: DEFAULT_EAST,
            north: DEFAULT_NORTH,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// Download behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionSettings {
    /// Base URL tile locators are appended to.
    pub base_url: String,
    /// Archive extension, including the dot.
    pub extension: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    /// Read/write chunk size in bytes.
    pub chunk_size: usize,
    /// Pause between requests in milliseconds.
    pub delay_ms: u64,
    /// Concurrent downloads; 1 is sequential.
    pub parallel: usize,
    pub skip_existing: bool,
    /// Per-tile size estimate used by plans.
    pub estimated_tile_size: u64,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            delay_ms: DEFAULT_DELAY_MS,
            parallel: DEFAULT_PARALLEL,
            skip_existing: true,
            estimated_tile_size: DEFAULT_ESTIMATED_TILE_SIZE,
        }
    }
}

/// Elevation processing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingSettings {
    /// Output pixel size in degrees.
    pub resolution: f64,
    pub resampling: String,
    /// Contour interval in metres.
    pub contour_interval: u32,
    /// Heightmap edge length in pixels.
    pub heightmap_size: u32,
    pub hillshade_z: f64,
    pub hillshade_azimuth: f64,
    pub hillshade_altitude: f64,
    pub target_crs: String,
    /// Produce the reprojected raster.
    pub reproject: bool,
    pub compression: String,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            resampling: DEFAULT_RESAMPLING.to_string(),
            contour_interval: DEFAULT_CONTOUR_INTERVAL,
            heightmap_size: DEFAULT_HEIGHTMAP_SIZE,
            hillshade_z: DEFAULT_HILLSHADE_Z,
            hillshade_azimuth: DEFAULT_HILLSHADE_AZIMUTH,
            hillshade_altitude: DEFAULT_HILLSHADE_ALTITUDE,
            target_crs: DEFAULT_TARGET_CRS.to_string(),
            reproject: false,
            compression: DEFAULT_COMPRESSION.to_string(),
        }
    }
}

/// External tool resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolchainSettings {
    /// Directory holding the GDAL binaries; `PATH` when unset.
    pub bin_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl ConfigFile {
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.paths.data_dir)
    }

    pub fn region(&self) -> Result<Region, GridError> {
        let r = &self.region;
        Region::new(r.west, r.south, r.east, r.north)
    }

    /// Tile grid over the configured region, writing into the tile directory.
    pub fn tile_grid(&self) -> Result<TileGrid, GridError> {
        Ok(TileGrid::new(self.region()?, self.region.tile_size)?
            .with_base_url(&self.acquisition.base_url)
            .with_extension(&self.acquisition.extension)
            .with_destination_dir(self.layout().dem_tiles_dir()))
    }

    pub fn acquisition_config(&self) -> AcquisitionConfig {
        let a = &self.acquisition;
        let options = FetchOptions::default()
            .with_skip_if_exists(a.skip_existing)
            .with_timeout(Duration::from_secs(a.timeout))
            .with_chunk_size(a.chunk_size);

        AcquisitionConfig::default()
            .with_options(options)
            .with_request_delay(Duration::from_millis(a.delay_ms))
            .with_parallel(a.parallel)
            .with_estimated_item_bytes(a.estimated_tile_size)
    }

    pub fn dem_config(&self) -> Result<DemGraphConfig, GridError> {
        let layout = self.layout();
        let p = &self.processing;

        let mut config = DemGraphConfig::new(
            self.region()?,
            layout.processed_dir(),
            layout.geojson_dir(),
        );
        config.resolution = p.resolution;
        config.resampling = p.resampling.clone();
        config.contour_interval = p.contour_interval;
        config.heightmap_size = p.heightmap_size;
        config.hillshade = HillshadeParams {
            z_factor: p.hillshade_z,
            azimuth: p.hillshade_azimuth,
            altitude: p.hillshade_altitude,
        };
        config.target_crs = p.target_crs.clone();
        config.reproject = p.reproject;
        config.compression = p.compression.clone();
        Ok(config)
    }

    pub fn tool_runner(&self) -> ProcessToolRunner {
        match &self.toolchain.bin_dir {
            Some(dir) => ProcessToolRunner::new().with_bin_dir(dir),
            None => ProcessToolRunner::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.paths.data_dir, PathBuf::from("data"));
        assert_eq!(config.region.tile_size, 5);
        assert_eq!(config.acquisition.delay_ms, 1000);
        assert!(config.acquisition.skip_existing);
        assert!(!config.processing.reproject);
        assert!(config.toolchain.bin_dir.is_none());
    }

    #[test]
    fn test_default_tile_grid() {
        let grid = ConfigFile::default().tile_grid().unwrap();

        // 25° x 10° at 5° per tile
        assert_eq!(grid.len(), 10);
        assert_eq!(grid.destination_dir(), PathBuf::from("data/dem/jaxa_aw3d30"));
    }

    #[test]
    fn test_acquisition_config() {
        let mut config = ConfigFile::default();
        config.acquisition.parallel = 4;
        config.acquisition.delay_ms = 250;
        config.acquisition.skip_existing = false;

        let acq = config.acquisition_config();
        assert_eq!(acq.parallel, 4);
        assert_eq!(acq.request_delay, Duration::from_millis(250));
        assert!(!acq.options.skip_if_exists);
    }

    #[test]
    fn test_dem_config() {
        let mut config = ConfigFile::default();
        config.processing.contour_interval = 50;
        config.processing.reproject = true;

        let dem = config.dem_config().unwrap();
        assert_eq!(dem.contour_interval, 50);
        assert!(dem.reproject);
        assert_eq!(dem.processed_dir, PathBuf::from("data/dem/processed"));
        assert_eq!(dem.region.west, 20.0);
    }

    #[test]
    fn test_invalid_region() {
        let mut config = ConfigFile::default();
        config.region.east = 10.0;
        assert!(config.region().is_err());
        assert!(config.tile_grid().is_err());
        assert!(config.dem_config().is_err());
    }

    #[test]
    fn test_tool_runner_bin_dir() {
        let mut config = ConfigFile::default();
        config.toolchain.bin_dir = Some(PathBuf::from("/opt/gdal/bin"));
        assert_eq!(
            config.tool_runner().resolve("gdalinfo"),
            PathBuf::from("/opt/gdal/bin/gdalinfo")
        );
    }
}
