//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let r = &config.region;
    let a = &config.acquisition;
    let p = &config.processing;
    let bin_dir = config
        .toolchain
        .bin_dir
        .as_ref()
        .map(|p| path_to_string(p))
        .unwrap_or_default();

    format!(
        r#"[paths]
; Root of the project data tree (dem/, geojson/, boundaries/, historical_maps/)
data_dir = {}

[region]
; Area of interest in decimal degrees (WGS84)
west = {}
south = {}
east = {}
north = {}
; Tile edge length in whole degrees; must divide 90
tile_size = {}

[acquisition]
; Tile archives are fetched from <base_url><tile locator><extension>
base_url = {}
extension = {}
; Per-request timeout in seconds
timeout = {}
; Download buffer size in bytes
chunk_size = {}
; Pause between requests in milliseconds (shared across workers when parallel)
delay_ms = {}
; Concurrent downloads; 1 downloads one tile at a time
parallel = {}
; Leave tiles that already exist on disk untouched
skip_existing = {}
; Size estimate per tile used by --plan (KB, MB, GB suffixes)
estimated_tile_size = {}

[processing]
; Output pixel size in degrees (0.001 is roughly 100 m)
resolution = {}
; One of: {}
resampling = {}
; Contour interval in metres
contour_interval = {}
; Heightmap PNG width and height in pixels
heightmap_size = {}
; Hillshade vertical exaggeration and light direction
hillshade_z = {}
hillshade_azimuth = {}
hillshade_altitude = {}
; CRS of the optional reprojected raster
target_crs = {}
reproject = {}
; One of: {}
compression = {}

[toolchain]
; Directory containing gdalwarp, gdal_translate, ...; empty uses PATH
bin_dir = {}

[logging]
file = {}
"#,
        path_to_string(&config.paths.data_dir),
        r.west,
        r.south,
        r.east,
        r.north,
        r.tile_size,
        a.base_url,
        a.extension,
        a.timeout,
        a.chunk_size,
        a.delay_ms,
        a.parallel,
        a.skip_existing,
        format_size(a.estimated_tile_size),
        p.resolution,
        super::defaults::RESAMPLING_METHODS.join(", "),
        p.resampling,
        p.contour_interval,
        p.heightmap_size,
        p.hillshade_z,
        p.hillshade_azimuth,
        p.hillshade_altitude,
        p.target_crs,
        p.reproject,
        super::defaults::COMPRESSION_METHODS.join(", "),
        p.compression,
        bin_dir,
        path_to_string(&config.logging.file),
    )
}

/// Render a path, abbreviating the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
