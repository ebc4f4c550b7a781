//! Elevation processing graph.
//!
//! ```text
//! merge ──► crop ──┬──► contour
//!                  ├──► hillshade
//!                  ├──► heightmap
//!                  └──► reproject   (opt-in)
//! ```
//!
//! Merge and crop are required; every product hangs off the cropped raster
//! and fails independently of its siblings.

use std::path::{Path, PathBuf};

use glob::glob;
use tracing::warn;

use super::StageSpec;
use crate::grid::Region;
use crate::toolchain::ToolInvocation;

pub const STAGE_MERGE: &str = "merge";
pub const STAGE_CROP: &str = "crop";
pub const STAGE_CONTOUR: &str = "contour";
pub const STAGE_HILLSHADE: &str = "hillshade";
pub const STAGE_HEIGHTMAP: &str = "heightmap";
pub const STAGE_REPROJECT: &str = "reproject";

/// Suffix of surface-model rasters inside extracted tile archives.
pub const DSM_SUFFIX: &str = "_DSM.tif";

/// Geographic CRS every cropped product is written in.
pub const GEOGRAPHIC_CRS: &str = "EPSG:4326";

/// Hillshade lighting parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HillshadeParams {
    /// Vertical exaggeration.
    pub z_factor: f64,
    /// Light azimuth in degrees.
    pub azimuth: f64,
    /// Light altitude in degrees.
    pub altitude: f64,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            z_factor: 2.0,
            azimuth: 315.0,
            altitude: 45.0,
        }
    }
}

/// Parameters of the elevation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DemGraphConfig {
    /// Crop window.
    pub region: Region,
    /// Output pixel size in degrees.
    pub resolution: f64,
    /// Resampling method for crop and reprojection.
    pub resampling: String,
    /// Contour interval in metres.
    pub contour_interval: u32,
    /// Heightmap width and height in pixels.
    pub heightmap_size: u32,
    pub hillshade: HillshadeParams,
    /// Target CRS of the reprojected raster.
    pub target_crs: String,
    /// Whether to add the reprojection stage.
    pub reproject: bool,
    /// GeoTIFF compression.
    pub compression: String,
    /// Directory for raster products.
    pub processed_dir: PathBuf,
    /// Directory for vector products (contours).
    pub geojson_dir: PathBuf,
}

impl DemGraphConfig {
    /// Config with the standard parameters for `region`.
    pub fn new(region: Region, processed_dir: impl Into<PathBuf>, geojson_dir: impl Into<PathBuf>) -> Self {
        Self {
            region,
            resolution: 0.001,
            resampling: "bilinear".to_string(),
            contour_interval: 100,
            heightmap_size: 2048,
            hillshade: HillshadeParams::default(),
            target_crs: "EPSG:3034".to_string(),
            reproject: false,
            compression: "LZW".to_string(),
            processed_dir: processed_dir.into(),
            geojson_dir: geojson_dir.into(),
        }
    }

    pub fn merged_path(&self) -> PathBuf {
        self.processed_dir.join("merged_dem.vrt")
    }

    pub fn cropped_path(&self) -> PathBuf {
        self.processed_dir.join("merged_dem_cropped.tif")
    }

    pub fn contours_path(&self) -> PathBuf {
        self.geojson_dir
            .join(format!("contours_{}m.geojson", self.contour_interval))
    }

    pub fn hillshade_path(&self) -> PathBuf {
        self.processed_dir.join("hillshade.tif")
    }

    pub fn heightmap_path(&self) -> PathBuf {
        self.processed_dir
            .join(format!("heightmap_{}.png", self.heightmap_size))
    }

    pub fn reprojected_path(&self) -> PathBuf {
        let suffix = self
            .target_crs
            .rsplit(':')
            .next()
            .unwrap_or(&self.target_crs)
            .to_lowercase();
        self.processed_dir.join(format!("merged_dem_{}.tif", suffix))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.processed_dir.join("processing_summary.json")
    }

    fn compress_option(&self) -> String {
        format!("COMPRESS={}", self.compression)
    }
}

/// Build the elevation graph over `rasters`.
pub fn build_dem_graph(config: &DemGraphConfig, rasters: &[PathBuf]) -> Vec<StageSpec> {
    let merged = config.merged_path();
    let cropped = config.cropped_path();
    let region = &config.region;

    // gdalbuildvrt only writes VRT, so it takes no format flag
    let merge = StageSpec::new(
        STAGE_MERGE,
        ToolInvocation::new("gdalbuildvrt").output().inputs(rasters),
        &merged,
    )
    .with_inputs(rasters.iter().cloned())
    .required();

    let crop = StageSpec::new(
        STAGE_CROP,
        ToolInvocation::new("gdalwarp")
            .option("-of", "GTiff")
            .option("-t_srs", GEOGRAPHIC_CRS)
            .option_values(
                "-te",
                [region.west, region.south, region.east, region.north],
            )
            .option_values("-tr", [config.resolution, config.resolution])
            .option("-r", &config.resampling)
            .option("-co", config.compress_option())
            .option("-co", "TILED=YES")
            .input(&merged)
            .output(),
        &cropped,
    )
    .after(STAGE_MERGE)
    .with_inputs([merged.clone()])
    .required();

    let contour = StageSpec::new(
        STAGE_CONTOUR,
        ToolInvocation::new("gdal_contour")
            .option("-f", "GeoJSON")
            .option("-a", "elevation")
            .option("-i", config.contour_interval)
            .input(&cropped)
            .output(),
        config.contours_path(),
    )
    .after(STAGE_CROP)
    .with_inputs([cropped.clone()]);

    let hillshade = StageSpec::new(
        STAGE_HILLSHADE,
        ToolInvocation::new("gdaldem")
            .subcommand("hillshade")
            .option("-of", "GTiff")
            .option("-z", config.hillshade.z_factor)
            .option("-az", config.hillshade.azimuth)
            .option("-alt", config.hillshade.altitude)
            .option("-co", config.compress_option())
            .input(&cropped)
            .output(),
        config.hillshade_path(),
    )
    .after(STAGE_CROP)
    .with_inputs([cropped.clone()]);

    let heightmap = StageSpec::new(
        STAGE_HEIGHTMAP,
        ToolInvocation::new("gdal_translate")
            .option("-of", "PNG")
            .option("-ot", "Byte")
            .option_values("-outsize", [config.heightmap_size, config.heightmap_size])
            .flag("-scale")
            .input(&cropped)
            .output(),
        config.heightmap_path(),
    )
    .after(STAGE_CROP)
    .with_inputs([cropped.clone()]);

    let mut stages = vec![merge, crop, contour, hillshade, heightmap];

    if config.reproject {
        stages.push(
            StageSpec::new(
                STAGE_REPROJECT,
                ToolInvocation::new("gdalwarp")
                    .option("-of", "GTiff")
                    .option("-t_srs", &config.target_crs)
                    .option("-r", &config.resampling)
                    .option("-co", config.compress_option())
                    .input(&cropped)
                    .output(),
                config.reprojected_path(),
            )
            .after(STAGE_CROP)
            .with_inputs([cropped]),
        );
    }

    stages
}

/// Find surface-model rasters anywhere below `dir`, sorted by path.
pub fn discover_rasters(dir: &Path) -> Vec<PathBuf> {
    let pattern = dir.join("**").join(format!("*{}", DSM_SUFFIX));
    let pattern = pattern.to_string_lossy();

    let mut rasters: Vec<PathBuf> = match glob(&pattern) {
        Ok(paths) => paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "Unreadable path during raster discovery");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "Invalid raster discovery pattern");
            Vec::new()
        }
    };

    rasters.sort();
    rasters
}
