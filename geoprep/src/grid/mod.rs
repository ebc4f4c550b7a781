//! Tile grid resolution.
//!
//! Maps a geographic bounding region and a fixed tile edge length onto the
//! remote server's fixed tile grid. Bands are snapped outward to multiples of
//! the tile size, so the enumerated tiles always cover the requested region
//! completely and are never smaller than the tile size.
//!
//! Enumeration is row-major: latitude bands ascending, then longitude bands
//! ascending within each row. The ordering is stable, which makes
//! [`TileSpec::index`] usable for resuming a run part-way through.
//!
//! # Example
//!
//! ```
//! use geoprep::grid::{Region, TileGrid};
//!
//! let region = Region::new(20.0, 50.0, 45.0, 60.0).unwrap();
//! let grid = TileGrid::new(region, 5).unwrap();
//! let tiles = grid.tiles();
//!
//! assert_eq!(tiles.len(), 10);
//! assert_eq!(tiles[0].id.to_string(), "N050E020_N055E025");
//! ```

mod tile_id;

pub use tile_id::{format_latitude, format_longitude, TileId};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Base URL of the JAXA AW3D30 release the default grid points at.
pub const DEFAULT_BASE_URL: &str = "https://www.eorc.jaxa.jp/ALOS/aw3d30/data/release_v2404/";

/// Archive extension appended to tile identifiers.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = ".zip";

/// Default tile edge length in degrees.
pub const DEFAULT_TILE_SIZE: u32 = 5;

/// Errors raised while building a tile grid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Region bounds are not a usable bounding box.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Tile size does not evenly partition the globe.
    #[error("Invalid tile size {0}°: must be a whole number of degrees that divides 90")]
    InvalidTileSize(u32),

    /// String is not a tile identifier.
    #[error("Invalid tile identifier: '{0}'")]
    InvalidTileId(String),
}

/// Geographic bounding region in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Region {
    /// Create a validated region.
    ///
    /// Latitudes must lie within ±90, longitudes within ±180, and the
    /// region must have positive extent on both axes.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, GridError> {
        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(GridError::InvalidRegion(
                "bounds must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(GridError::InvalidRegion(format!(
                "latitudes must be within ±90 (south={}, north={})",
                south, north
            )));
        }
        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(GridError::InvalidRegion(format!(
                "longitudes must be within ±180 (west={}, east={})",
                west, east
            )));
        }
        if south >= north {
            return Err(GridError::InvalidRegion(format!(
                "south ({}) must be less than north ({})",
                south, north
            )));
        }
        if west >= east {
            return Err(GridError::InvalidRegion(format!(
                "west ({}) must be less than east ({})",
                west, east
            )));
        }

        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// Check whether a point lies inside the region (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// One tile of the enumerated grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSpec {
    /// Position in the row-major enumeration.
    pub index: usize,
    /// Latitude band (low, high) in whole degrees.
    pub lat_band: (i32, i32),
    /// Longitude band (low, high) in whole degrees.
    pub lon_band: (i32, i32),
    /// Identifier derived from the bands.
    pub id: TileId,
    /// Remote locator.
    pub url: String,
    /// Local archive path.
    pub destination: PathBuf,
}

impl TileSpec {
    /// Check whether a point lies inside this tile (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_band.0 as f64
            && lat <= self.lat_band.1 as f64
            && lon >= self.lon_band.0 as f64
            && lon <= self.lon_band.1 as f64
    }
}

/// Resolver from a region and tile size to the ordered tile set.
#[derive(Debug, Clone)]
pub struct TileGrid {
    region: Region,
    tile_size: u32,
    base_url: String,
    extension: String,
    destination_dir: PathBuf,
}

impl TileGrid {
    /// Create a grid over `region` with `tile_size`-degree tiles.
    ///
    /// The tile size must divide 90 so that snapped bands stay inside the
    /// valid coordinate range.
    pub fn new(region: Region, tile_size: u32) -> Result<Self, GridError> {
        if tile_size == 0 || 90 % tile_size != 0 {
            return Err(GridError::InvalidTileSize(tile_size));
        }

        Ok(Self {
            region,
            tile_size,
            base_url: DEFAULT_BASE_URL.to_string(),
            extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            destination_dir: PathBuf::from("."),
        })
    }

    /// Set the base URL tile identifiers are appended to.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the archive extension (a leading dot is added if missing).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = if extension.is_empty() || extension.starts_with('.') {
            extension
        } else {
            format!(".{}", extension)
        };
        self
    }

    /// Set the directory tile archives are stored in.
    pub fn with_destination_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination_dir = dir.into();
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    /// Latitude bands covering the region, ascending.
    pub fn latitude_bands(&self) -> Vec<(i32, i32)> {
        snapped_bands(self.region.south, self.region.north, self.tile_size)
    }

    /// Longitude bands covering the region, ascending.
    pub fn longitude_bands(&self) -> Vec<(i32, i32)> {
        snapped_bands(self.region.west, self.region.east, self.tile_size)
    }

    /// Number of tiles in the grid.
    pub fn len(&self) -> usize {
        self.latitude_bands().len() * self.longitude_bands().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remote locator for a tile identifier.
    pub fn locator(&self, id: &TileId) -> String {
        format!(
            "{}/{}{}",
            self.base_url.trim_end_matches('/'),
            id,
            self.extension
        )
    }

    /// Local archive path for a tile identifier.
    pub fn destination(&self, id: &TileId) -> PathBuf {
        self.destination_dir
            .join(format!("{}{}", id, self.extension))
    }

    /// Enumerate every tile in row-major order.
    pub fn tiles(&self) -> Vec<TileSpec> {
        let lon_bands = self.longitude_bands();
        let mut tiles = Vec::with_capacity(self.len());

        for lat_band in self.latitude_bands() {
            for &lon_band in &lon_bands {
                let id = TileId::new(lat_band.0, lon_band.0, lat_band.1, lon_band.1);
                tiles.push(TileSpec {
                    index: tiles.len(),
                    lat_band,
                    lon_band,
                    id,
                    url: self.locator(&id),
                    destination: self.destination(&id),
                });
            }
        }

        tiles
    }

    /// Enumerate tiles starting at a row-major index.
    pub fn tiles_from(&self, index: usize) -> Vec<TileSpec> {
        self.tiles().into_iter().skip(index).collect()
    }

    /// Select the tiles whose identifiers are listed, in grid order.
    ///
    /// Identifiers outside the grid are ignored.
    pub fn select(&self, ids: &[TileId]) -> Vec<TileSpec> {
        let wanted: HashSet<&TileId> = ids.iter().collect();
        self.tiles()
            .into_iter()
            .filter(|tile| wanted.contains(&tile.id))
            .collect()
    }
}

/// Snap `[low, high]` outward to multiples of `size` and split into bands.
fn snapped_bands(low: f64, high: f64, size: u32) -> Vec<(i32, i32)> {
    let size_f = size as f64;
    let start = (low / size_f).floor() as i32 * size as i32;
    let end = (high / size_f).ceil() as i32 * size as i32;

    (start..end)
        .step_by(size as usize)
        .map(|band| (band, band + size as i32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_region() -> Region {
        Region::new(20.0, 50.0, 45.0, 60.0).unwrap()
    }

    #[test]
    fn test_region_rejects_inverted_bounds() {
        assert!(Region::new(45.0, 50.0, 20.0, 60.0).is_err());
        assert!(Region::new(20.0, 60.0, 45.0, 50.0).is_err());
    }

    #[test]
    fn test_region_rejects_out_of_range() {
        assert!(Region::new(20.0, -91.0, 45.0, 60.0).is_err());
        assert!(Region::new(-181.0, 50.0, 45.0, 60.0).is_err());
        assert!(Region::new(f64::NAN, 50.0, 45.0, 60.0).is_err());
    }

    #[test]
    fn test_tile_size_must_divide_ninety() {
        let region = campaign_region();
        assert_eq!(
            TileGrid::new(region, 0).unwrap_err(),
            GridError::InvalidTileSize(0)
        );
        assert!(TileGrid::new(region, 7).is_err());
        assert!(TileGrid::new(region, 1).is_ok());
        assert!(TileGrid::new(region, 45).is_ok());
    }

    #[test]
    fn test_campaign_region_yields_ten_tiles() {
        let grid = TileGrid::new(campaign_region(), 5).unwrap();
        let tiles = grid.tiles();

        assert_eq!(tiles.len(), 10);
        assert_eq!(grid.latitude_bands(), vec![(50, 55), (55, 60)]);
        assert_eq!(grid.longitude_bands().len(), 5);

        let ids: Vec<String> = tiles.iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids[0], "N050E020_N055E025");
        assert_eq!(ids[4], "N050E040_N055E045");
        assert_eq!(ids[5], "N055E020_N060E025");
        assert_eq!(ids[9], "N055E040_N060E045");
    }

    #[test]
    fn test_indices_follow_enumeration() {
        let grid = TileGrid::new(campaign_region(), 5).unwrap();
        for (i, tile) in grid.tiles().iter().enumerate() {
            assert_eq!(tile.index, i);
        }
    }

    #[test]
    fn test_partial_extent_over_covers() {
        let region = Region::new(21.5, 51.2, 23.0, 52.0).unwrap();
        let grid = TileGrid::new(region, 5).unwrap();
        let tiles = grid.tiles();

        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].lat_band, (50, 55));
        assert_eq!(tiles[0].lon_band, (20, 25));
    }

    #[test]
    fn test_negative_region_snaps_outward() {
        let region = Region::new(-3.0, -2.0, 2.0, 1.0).unwrap();
        let grid = TileGrid::new(region, 5).unwrap();

        assert_eq!(grid.latitude_bands(), vec![(-5, 0), (0, 5)]);
        assert_eq!(grid.longitude_bands(), vec![(-5, 0), (0, 5)]);

        let ids: Vec<String> = grid.tiles().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "S005W005_N000E000",
                "S005E000_N000E005",
                "N000W005_N005E000",
                "N000E000_N005E005",
            ]
        );
    }

    #[test]
    fn test_negative_zero_is_canonical() {
        let region = Region::new(-0.0, -0.0, 4.0, 4.0).unwrap();
        let grid = TileGrid::new(region, 5).unwrap();
        let tiles = grid.tiles();

        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].id.to_string(), "N000E000_N005E005");
    }

    #[test]
    fn test_locator_and_destination() {
        let grid = TileGrid::new(campaign_region(), 5)
            .unwrap()
            .with_base_url("https://tiles.example.com/dem")
            .with_extension("zip")
            .with_destination_dir("/data/dem");
        let tile = &grid.tiles()[0];

        assert_eq!(
            tile.url,
            "https://tiles.example.com/dem/N050E020_N055E025.zip"
        );
        assert_eq!(
            tile.destination,
            PathBuf::from("/data/dem/N050E020_N055E025.zip")
        );
    }

    #[test]
    fn test_default_locator_uses_single_separator() {
        let grid = TileGrid::new(campaign_region(), 5).unwrap();
        let url = &grid.tiles()[0].url;
        assert_eq!(
            url,
            "https://www.eorc.jaxa.jp/ALOS/aw3d30/data/release_v2404/N050E020_N055E025.zip"
        );
    }

    #[test]
    fn test_tiles_from_resumes_by_index() {
        let grid = TileGrid::new(campaign_region(), 5).unwrap();
        let rest = grid.tiles_from(7);

        assert_eq!(rest.len(), 3);
        assert_eq!(rest[0].index, 7);
        assert!(grid.tiles_from(100).is_empty());
    }

    #[test]
    fn test_select_keeps_grid_order() {
        let grid = TileGrid::new(campaign_region(), 5).unwrap();
        let ids = vec![
            "N055E040_N060E045".parse().unwrap(),
            "N050E020_N055E025".parse().unwrap(),
            "S010E020_S005E025".parse().unwrap(),
        ];
        let selected = grid.select(&ids);

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].index, 0);
        assert_eq!(selected[1].index, 9);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        const SIZES: [u32; 8] = [1, 2, 3, 5, 6, 10, 15, 30];

        proptest! {
            #[test]
            fn test_grid_covers_region(
                west in -180.0..170.0_f64,
                width in 0.01..10.0_f64,
                south in -90.0..80.0_f64,
                height in 0.01..10.0_f64,
                size_index in 0usize..SIZES.len(),
                fx in 0.0..=1.0_f64,
                fy in 0.0..=1.0_f64,
            ) {
                let region = Region::new(west, south, west + width, south + height).unwrap();
                let size = SIZES[size_index];
                let grid = TileGrid::new(region, size).unwrap();
                let tiles = grid.tiles();

                prop_assert!(!tiles.is_empty());

                for tile in &tiles {
                    prop_assert_eq!(tile.lat_band.1 - tile.lat_band.0, size as i32);
                    prop_assert_eq!(tile.lon_band.1 - tile.lon_band.0, size as i32);
                }

                let lat = south + fy * height;
                let lon = west + fx * width;
                prop_assert!(
                    tiles.iter().any(|t| t.contains(lat, lon)),
                    "point ({}, {}) not covered by size {} grid", lat, lon, size
                );
            }

            #[test]
            fn test_grid_identifiers_unique(
                west in -180.0..170.0_f64,
                width in 0.01..10.0_f64,
                south in -90.0..80.0_f64,
                height in 0.01..10.0_f64,
                size_index in 0usize..SIZES.len(),
            ) {
                let region = Region::new(west, south, west + width, south + height).unwrap();
                let grid = TileGrid::new(region, SIZES[size_index]).unwrap();
                let tiles = grid.tiles();

                let ids: HashSet<String> = tiles.iter().map(|t| t.id.to_string()).collect();
                prop_assert_eq!(ids.len(), tiles.len());
            }

            #[test]
            fn test_identifier_injective(
                a in (-90i32..90, -180i32..180, 1i32..10, 1i32..10),
                b in (-90i32..90, -180i32..180, 1i32..10, 1i32..10),
            ) {
                let id_a = TileId::new(a.0, a.1, a.0 + a.2, a.1 + a.3);
                let id_b = TileId::new(b.0, b.1, b.0 + b.2, b.1 + b.3);
                prop_assume!(id_a != id_b);
                prop_assert_ne!(id_a.to_string(), id_b.to_string());
            }

            #[test]
            fn test_identifier_parses_back(
                lat in -90i32..90,
                lon in -180i32..180,
                size in 1i32..10,
            ) {
                let id = TileId::new(lat, lon, lat + size, lon + size);
                let parsed: TileId = id.to_string().parse().unwrap();
                prop_assert_eq!(parsed, id);
            }
        }
    }
}
