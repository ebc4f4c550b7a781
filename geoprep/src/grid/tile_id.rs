//! Tile identifier formatting and parsing.
//!
//! Identifiers follow the remote archive naming scheme:
//! `{lat_low}{lon_low}_{lat_high}{lon_high}` where latitudes are written as
//! `N`/`S` plus a three-digit magnitude and longitudes as `E`/`W` plus a
//! three-digit magnitude.
//!
//! Examples:
//! - `N050E020_N055E025` (50–55°N, 20–25°E)
//! - `S005W010_N000W005` (5°S–0°, 10–5°W)

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::GridError;

/// Identifier of one fixed-size tile, derived from its integer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Southern edge in whole degrees
    pub lat_low: i32,
    /// Western edge in whole degrees
    pub lon_low: i32,
    /// Northern edge in whole degrees
    pub lat_high: i32,
    /// Eastern edge in whole degrees
    pub lon_high: i32,
}

impl TileId {
    /// Create an identifier from tile bounds.
    pub fn new(lat_low: i32, lon_low: i32, lat_high: i32, lon_high: i32) -> Self {
        Self {
            lat_low,
            lon_low,
            lat_high,
            lon_high,
        }
    }
}

/// Format a latitude as hemisphere letter plus three-digit magnitude.
///
/// Zero is always written as `N000`.
pub fn format_latitude(degrees: i32) -> String {
    let hemisphere = if degrees < 0 { 'S' } else { 'N' };
    format!("{}{:03}", hemisphere, degrees.unsigned_abs())
}

/// Format a longitude as hemisphere letter plus three-digit magnitude.
///
/// Zero is always written as `E000`.
pub fn format_longitude(degrees: i32) -> String {
    let hemisphere = if degrees < 0 { 'W' } else { 'E' };
    format!("{}{:03}", hemisphere, degrees.unsigned_abs())
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}{}",
            format_latitude(self.lat_low),
            format_longitude(self.lon_low),
            format_latitude(self.lat_high),
            format_longitude(self.lon_high)
        )
    }
}

fn tile_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([NS])(\d{3})([EW])(\d{3})_([NS])(\d{3})([EW])(\d{3})$").unwrap()
    })
}

fn signed(letter: &str, magnitude: &str, negative: &str) -> i32 {
    // three ASCII digits always fit
    let value: i32 = magnitude.parse().unwrap_or(0);
    if letter == negative {
        -value
    } else {
        value
    }
}

impl FromStr for TileId {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = tile_id_pattern()
            .captures(s.trim())
            .ok_or_else(|| GridError::InvalidTileId(s.to_string()))?;

        let group = |i: usize| captures.get(i).map(|m| m.as_str()).unwrap_or_default();

        let id = TileId::new(
            signed(group(1), group(2), "S"),
            signed(group(3), group(4), "W"),
            signed(group(5), group(6), "S"),
            signed(group(7), group(8), "W"),
        );

        if id.lat_low >= id.lat_high || id.lon_low >= id.lon_high {
            return Err(GridError::InvalidTileId(s.to_string()));
        }

        Ok(id)
    }
}
