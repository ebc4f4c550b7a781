//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::{COMPRESSION_METHODS, RESAMPLING_METHODS};
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::grid::{Region, TileGrid};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [paths] section
    if let Some(section) = ini.section(Some("paths")) {
        if let Some(v) = non_empty(section, "data_dir") {
            config.paths.data_dir = expand_tilde(v);
        }
    }

    // [region] section
    if let Some(section) = ini.section(Some("region")) {
        let r = &mut config.region;
        for (key, field) in [
            ("west", &mut r.west),
            ("south", &mut r.south),
            ("east", &mut r.east),
            ("north", &mut r.north),
        ] {
            if let Some(v) = section.get(key) {
                *field = parse_number(v, "region", key, "must be a number in decimal degrees")?;
            }
        }
        if let Some(v) = section.get("tile_size") {
            r.tile_size = parse_number(v, "region", "tile_size", "must be a whole number of degrees")?;
        }

        let region = Region::new(r.west, r.south, r.east, r.north).map_err(|e| {
            ConfigFileError::InvalidValue {
                section: "region".to_string(),
                key: "bounds".to_string(),
                value: format!("{},{},{},{}", r.west, r.south, r.east, r.north),
                reason: e.to_string(),
            }
        })?;
        if TileGrid::new(region, r.tile_size).is_err() {
            return Err(ConfigFileError::InvalidValue {
                section: "region".to_string(),
                key: "tile_size".to_string(),
                value: r.tile_size.to_string(),
                reason: "must divide 90 (e.g. 1, 5, 10)".to_string(),
            });
        }
    }

    // [acquisition] section
    if let Some(section) = ini.section(Some("acquisition")) {
        let a = &mut config.acquisition;
        if let Some(v) = non_empty(section, "base_url") {
            a.base_url = v.to_string();
        }
        if let Some(v) = non_empty(section, "extension") {
            a.extension = if v.starts_with('.') {
                v.to_string()
            } else {
                format!(".{}", v)
            };
        }
        if let Some(v) = section.get("timeout") {
            a.timeout = parse_number(v, "acquisition", "timeout", "must be a positive integer (seconds)")?;
        }
        if let Some(v) = section.get("chunk_size") {
            a.chunk_size = parse_number(v, "acquisition", "chunk_size", "must be a positive integer (bytes)")?;
            if a.chunk_size == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "acquisition".to_string(),
                    key: "chunk_size".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(v) = section.get("delay_ms") {
            a.delay_ms = parse_number(v, "acquisition", "delay_ms", "must be a non-negative integer (milliseconds)")?;
        }
        if let Some(v) = section.get("parallel") {
            a.parallel = parse_number(v, "acquisition", "parallel", "must be a positive integer")?;
            if a.parallel == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "acquisition".to_string(),
                    key: "parallel".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(v) = section.get("skip_existing") {
            a.skip_existing = parse_bool(v);
        }
        if let Some(v) = section.get("estimated_tile_size") {
            a.estimated_tile_size =
                parse_size(v).map_err(|_| ConfigFileError::InvalidValue {
                    section: "acquisition".to_string(),
                    key: "estimated_tile_size".to_string(),
                    value: v.to_string(),
                    reason: "expected format like '150MB', '1GB', or '1024KB'".to_string(),
                })?;
        }
    }

    // [processing] section
    if let Some(section) = ini.section(Some("processing")) {
        let p = &mut config.processing;
        if let Some(v) = section.get("resolution") {
            p.resolution = parse_number(v, "processing", "resolution", "must be a number of degrees")?;
            if p.resolution <= 0.0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "processing".to_string(),
                    key: "resolution".to_string(),
                    value: v.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(v) = section.get("resampling") {
            p.resampling = one_of(v, RESAMPLING_METHODS, "processing", "resampling")?;
        }
        if let Some(v) = section.get("contour_interval") {
            p.contour_interval = parse_number(v, "processing", "contour_interval", "must be a positive integer (metres)")?;
        }
        if let Some(v) = section.get("heightmap_size") {
            p.heightmap_size = parse_number(v, "processing", "heightmap_size", "must be a positive integer (pixels)")?;
        }
        if let Some(v) = section.get("hillshade_z") {
            p.hillshade_z = parse_number(v, "processing", "hillshade_z", "must be a number")?;
        }
        if let Some(v) = section.get("hillshade_azimuth") {
            p.hillshade_azimuth = parse_number(v, "processing", "hillshade_azimuth", "must be a number of degrees")?;
        }
        if let Some(v) = section.get("hillshade_altitude") {
            p.hillshade_altitude = parse_number(v, "processing", "hillshade_altitude", "must be a number of degrees")?;
        }
        if let Some(v) = non_empty(section, "target_crs") {
            p.target_crs = v.to_string();
        }
        if let Some(v) = section.get("reproject") {
            p.reproject = parse_bool(v);
        }
        if let Some(v) = section.get("compression") {
            p.compression = one_of(&v.to_uppercase(), COMPRESSION_METHODS, "processing", "compression")?;
        }
    }

    // [toolchain] section
    if let Some(section) = ini.section(Some("toolchain")) {
        if let Some(v) = non_empty(section, "bin_dir") {
            config.toolchain.bin_dir = Some(expand_tilde(v));
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
}

fn one_of(
    value: &str,
    allowed: &[&str],
    section: &str,
    key: &str,
) -> Result<String, ConfigFileError> {
    let value = value.trim();
    if allowed.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("must be one of: {}", allowed.join(", ")),
        })
    }
}

/// Parse a boolean value from string.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
