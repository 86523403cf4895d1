//! Tile addressing for 1°×1° Copernicus DEM cells.
//!
//! Copernicus DSM tiles cover exactly one degree of latitude and longitude
//! and are named by their lower-left (south-west) corner:
//!
//! `Copernicus_DSM_COG_10_{N|S}{lat}_00_{E|W}{lon}_00_DEM.tif`
//!
//! - Latitude: 2 digits with N/S prefix (e.g., N47, S01)
//! - Longitude: 3 digits with E/W prefix (e.g., E009, W123)
//!
//! The corner is computed with mathematical floor, so negative coordinates
//! round toward more-negative integers: -0.5° falls in the cell whose corner
//! is -1°, not 0°. This naming convention must match the external tool that
//! provisions tiles onto disk.

use std::fmt;

/// Fixed prefix of every Copernicus DSM tile file name.
pub const TILE_PREFIX: &str = "Copernicus_DSM_COG_10_";

/// Fixed suffix of every Copernicus DSM tile file name.
pub const TILE_SUFFIX: &str = "_DEM.tif";

/// Identifier of the 1°×1° cell covering a coordinate.
///
/// Two coordinates in the same cell always produce the same `TileId`, so it
/// doubles as the cache key for open tile handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    /// Latitude of the south-west corner (integer degrees).
    lat: i32,
    /// Longitude of the south-west corner (integer degrees).
    lon: i32,
}

impl TileId {
    /// Create a tile id from integer corner coordinates.
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// The cell covering the given coordinate.
    ///
    /// A coordinate exactly on an integer degree belongs to the cell for
    /// which that integer is the lower-left corner.
    pub fn for_coord(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.floor() as i32,
            lon: lon.floor() as i32,
        }
    }

    /// Latitude of the south-west corner.
    pub fn lat(&self) -> i32 {
        self.lat
    }

    /// Longitude of the south-west corner.
    pub fn lon(&self) -> i32 {
        self.lon
    }

    /// The file name of the tile covering this cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use copdem::TileId;
    ///
    /// let id = TileId::for_coord(47.5, 9.5);
    /// assert_eq!(
    ///     id.file_name(),
    ///     "Copernicus_DSM_COG_10_N47_00_E009_00_DEM.tif"
    /// );
    /// ```
    pub fn file_name(&self) -> String {
        format!("{}{}{}", TILE_PREFIX, self, TILE_SUFFIX)
    }

    /// Parse a tile id back from a file name.
    ///
    /// Accepts a bare file name or a full path; returns `None` if the name
    /// does not follow the Copernicus convention.
    pub fn from_file_name(name: &str) -> Option<Self> {
        // Extract just the file name if a path is given
        let name = name
            .rsplit('/')
            .next()
            .unwrap_or(name)
            .rsplit('\\')
            .next()
            .unwrap_or(name);

        let tag = name.strip_prefix(TILE_PREFIX)?.strip_suffix(TILE_SUFFIX)?;

        // Tag format: N47_00_E009_00
        let mut parts = tag.split('_');
        let lat_part = parts.next()?;
        if parts.next()? != "00" {
            return None;
        }
        let lon_part = parts.next()?;
        if parts.next()? != "00" || parts.next().is_some() {
            return None;
        }

        let lat_sign = match lat_part.chars().next()? {
            'N' => 1,
            'S' => -1,
            _ => return None,
        };
        let lat: i32 = lat_part.get(1..)?.parse().ok()?;

        let lon_sign = match lon_part.chars().next()? {
            'E' => 1,
            'W' => -1,
            _ => return None,
        };
        let lon: i32 = lon_part.get(1..)?.parse().ok()?;

        Some(Self {
            lat: lat * lat_sign,
            lon: lon * lon_sign,
        })
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_prefix = if self.lat >= 0 { 'N' } else { 'S' };
        let lon_prefix = if self.lon >= 0 { 'E' } else { 'W' };
        write!(
            f,
            "{}{:02}_00_{}{:03}_00",
            lat_prefix,
            self.lat.abs(),
            lon_prefix,
            self.lon.abs()
        )
    }
}
