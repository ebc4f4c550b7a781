//! Default values and well-known paths.

use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";

// Campaign region: 20°E-45°E, 50°N-60°N
pub const DEFAULT_WEST: f64 = 20.0;
pub const DEFAULT_SOUTH: f64 = 50.0;
pub const DEFAULT_EAST: f64 = 45.0;
pub const DEFAULT_NORTH: f64 = 60.0;

pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_PARALLEL: usize = 1;
pub const DEFAULT_ESTIMATED_TILE_SIZE: u64 = crate::acquisition::DEFAULT_ESTIMATED_ITEM_BYTES;

pub const DEFAULT_RESOLUTION: f64 = 0.001;
pub const DEFAULT_RESAMPLING: &str = "bilinear";
pub const DEFAULT_CONTOUR_INTERVAL: u32 = 100;
pub const DEFAULT_HEIGHTMAP_SIZE: u32 = 2048;
pub const DEFAULT_HILLSHADE_Z: f64 = 2.0;
pub const DEFAULT_HILLSHADE_AZIMUTH: f64 = 315.0;
pub const DEFAULT_HILLSHADE_ALTITUDE: f64 = 45.0;
pub const DEFAULT_TARGET_CRS: &str = "EPSG:3034";
pub const DEFAULT_COMPRESSION: &str = "LZW";

/// Resampling methods accepted by gdalwarp that make sense for elevation.
pub const RESAMPLING_METHODS: &[&str] = &[
    "near", "bilinear", "cubic", "cubicspline", "lanczos", "average", "min", "max", "med",
];

/// GeoTIFF compression schemes.
pub const COMPRESSION_METHODS: &[&str] = &["NONE", "LZW", "DEFLATE", "ZSTD", "PACKBITS"];

/// Get the path to the config directory (~/.geoprep).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geoprep")
}

/// Get the path to the config file (~/.geoprep/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Get the default log file path (~/.geoprep/geoprep.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(crate::logging::DEFAULT_LOG_FILE)
}
