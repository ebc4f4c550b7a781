//! On-disk project layout under the data directory.
//!
//! ```text
//! <data>/
//! ├── dem/
//! │   ├── jaxa_aw3d30/     tile archives and extracted rasters
//! │   └── processed/       merged, cropped and derived rasters
//! ├── geojson/             vector outputs
//! ├── boundaries/          Natural Earth shapefiles
//! └── historical_maps/     scanned reference maps
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves every well-known directory from one data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    data_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn dem_tiles_dir(&self) -> PathBuf {
        self.data_dir.join("dem").join("jaxa_aw3d30")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("dem").join("processed")
    }

    pub fn geojson_dir(&self) -> PathBuf {
        self.data_dir.join("geojson")
    }

    pub fn boundaries_dir(&self) -> PathBuf {
        self.data_dir.join("boundaries")
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.data_dir.join("historical_maps")
    }

    /// Default location of the campaign timeline.
    pub fn timeline_path(&self) -> PathBuf {
        self.data_dir.join("timeline.json")
    }

    /// Default location of the generated events collection.
    pub fn events_path(&self) -> PathBuf {
        self.geojson_dir().join("events.geojson")
    }

    /// Create every output directory.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.dem_tiles_dir(),
            self.processed_dir(),
            self.geojson_dir(),
            self.boundaries_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = ProjectLayout::new("/srv/data");
        assert_eq!(
            layout.dem_tiles_dir(),
            PathBuf::from("/srv/data/dem/jaxa_aw3d30")
        );
        assert_eq!(layout.processed_dir(), PathBuf::from("/srv/data/dem/processed"));
        assert_eq!(
            layout.events_path(),
            PathBuf::from("/srv/data/geojson/events.geojson")
        );
    }

    #[test]
    fn test_ensure_dirs() {
        let temp = TempDir::new().unwrap();
        let layout = ProjectLayout::new(temp.path().join("data"));

        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();

        assert!(layout.dem_tiles_dir().is_dir());
        assert!(layout.processed_dir().is_dir());
        assert!(layout.geojson_dir().is_dir());
        assert!(layout.boundaries_dir().is_dir());
    }
}
