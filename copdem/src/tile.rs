//! Copernicus DEM GeoTIFF decoding and single-pixel access.
//!
//! This module provides [`RasterTile`], one opened, read-only raster tile:
//! its pixel grid, its georeferencing transform, and its nodata sentinel.
//! A tile is immutable after creation and is shared behind `Arc` by the
//! [`crate::TileStore`].

use std::io::{Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::cell::TileId;
use crate::error::{DemError, Result};

/// GeoTIFF ModelPixelScaleTag: degrees per pixel in x and y.
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;

/// GeoTIFF ModelTiepointTag: pixel ↔ geographic anchor points.
const TAG_MODEL_TIEPOINT: u16 = 33922;

/// GDAL_NODATA tag: the nodata sentinel, stored as an ASCII string.
const TAG_GDAL_NODATA: u16 = 42113;

/// Mapping between WGS84 coordinates and pixel row/column indices.
///
/// Row 0 is the north edge, column 0 the west edge; the raster is stored
/// row-major, north to south.
#[derive(Debug, Clone, Copy)]
pub struct GeoTransform {
    /// Longitude of the raster's west edge.
    pub origin_lon: f64,
    /// Latitude of the raster's north edge.
    pub origin_lat: f64,
    /// Degrees of longitude per pixel column.
    pub pixel_width: f64,
    /// Degrees of latitude per pixel row.
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Convert a coordinate to (row, col).
    ///
    /// Uses floor semantics: the returned pixel is the one whose ground cell
    /// contains the point. Indices may be negative or past the raster edge
    /// for coordinates outside the tile; callers bounds-check.
    pub fn index(&self, lat: f64, lon: f64) -> (i64, i64) {
        let row = ((self.origin_lat - lat) / self.pixel_height).floor() as i64;
        let col = ((lon - self.origin_lon) / self.pixel_width).floor() as i64;
        (row, col)
    }

    /// Transform for a raster covering exactly the 1°×1° cell of `id`.
    ///
    /// Used when a tile file carries no georeferencing tags: the cell corner
    /// comes from the file name convention, the scale from the dimensions.
    pub fn for_cell(id: TileId, width: u32, height: u32) -> Self {
        Self {
            origin_lon: id.lon() as f64,
            origin_lat: (id.lat() + 1) as f64,
            pixel_width: 1.0 / width as f64,
            pixel_height: 1.0 / height as f64,
        }
    }
}

/// One decoded, read-only Copernicus DEM tile.
pub struct RasterTile {
    /// Elevation samples in meters, row-major, north to south.
    data: Vec<f32>,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// Coordinate ↔ pixel mapping.
    transform: GeoTransform,
    /// Nodata sentinel from the GDAL_NODATA tag, if the tile carries one.
    nodata: Option<f32>,
}

impl RasterTile {
    /// Open and fully decode a tile file.
    ///
    /// The georeferencing transform is read from the GeoTIFF tags; tiles
    /// without tags fall back to the transform implied by the cell `id` and
    /// the raster dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not a decodable
    /// TIFF, or decodes to an inconsistent sample count.
    pub fn open<P: AsRef<Path>>(path: P, id: TileId) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(file)?;

        // Copernicus GLO-30 tiles are 3600×3600 f32 samples (~50 MB decoded)
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 256 * 1024 * 1024;
        limits.intermediate_buffer_size = 256 * 1024 * 1024;
        limits.ifd_value_size = 16 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let transform = read_geotransform(&mut decoder)
            .unwrap_or_else(|| GeoTransform::for_cell(id, width, height));
        let nodata = read_nodata(&mut decoder);
        let data = decode_samples(&mut decoder)?;

        if data.len() != width as usize * height as usize {
            return Err(DemError::CorruptRaster {
                path: path.to_path_buf(),
                detail: format!(
                    "expected {} samples for {}x{}, got {}",
                    width as usize * height as usize,
                    width,
                    height,
                    data.len()
                ),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            transform,
            nodata,
        })
    }

    /// Elevation in meters at a coordinate, or `None` when the pixel falls
    /// outside the raster or holds the nodata sentinel.
    pub fn sample(&self, lat: f64, lon: f64) -> Option<f64> {
        let (row, col) = self.transform.index(lat, lon);
        if row < 0 || col < 0 || row >= i64::from(self.height) || col >= i64::from(self.width) {
            return None;
        }
        self.pixel(row as u32, col as u32)
    }

    /// Elevation in meters at a pixel, or `None` for out-of-range indices
    /// and nodata pixels.
    pub fn pixel(&self, row: u32, col: u32) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let idx = row as usize * self.width as usize + col as usize;
        let value = *self.data.get(idx)?;
        if !value.is_finite() {
            return None;
        }
        if let Some(nodata) = self.nodata {
            if (value - nodata).abs() < 0.001 {
                return None;
            }
        }
        Some(f64::from(value))
    }

    /// Width and height in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The tile's georeferencing transform.
    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// The tile's nodata sentinel, if any.
    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }
}

/// Read the georeferencing transform from ModelTiepoint + ModelPixelScale.
///
/// Returns `None` when the tags are absent or unusable.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(TAG_MODEL_TIEPOINT)).ok()?;
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(TAG_MODEL_PIXEL_SCALE)).ok()?;

    if tiepoint.len() < 6 || scale.len() < 2 {
        return None;
    }

    // Tiepoint is [i, j, k, x, y, z]: pixel (i, j) anchors at geographic (x, y)
    let (i, j) = (tiepoint[0], tiepoint[1]);
    let (x, y) = (tiepoint[3], tiepoint[4]);
    let (scale_x, scale_y) = (scale[0], scale[1]);

    if !(scale_x > 0.0 && scale_y > 0.0) {
        return None;
    }

    Some(GeoTransform {
        origin_lon: x - i * scale_x,
        origin_lat: y + j * scale_y,
        pixel_width: scale_x,
        pixel_height: scale_y,
    })
}

/// Read the nodata sentinel from the GDAL_NODATA tag, if present.
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    decoder
        .get_tag_ascii_string(Tag::Unknown(TAG_GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Decode the image into f32 samples regardless of on-disk sample type.
fn decode_samples<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Vec<f32>> {
    let result = decoder.read_image()?;

    let data = match result {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
    };

    Ok(data)
}
