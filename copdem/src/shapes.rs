//! Shape-dispatching batch augmentation.
//!
//! Three request shapes are recognized and augmented with ground elevation:
//!
//! - a GeoJSON `FeatureCollection` (optionally wrapped in a `geojson` field),
//! - a bare coordinate list `{"coordinates": [{"lat", "lon"}, …]}`,
//! - a track-point sequence `{"track_points": [{"timestamp", "lat", "lon", …}, …]}`.
//!
//! The dispatch order is part of the wire contract: type discriminator,
//! then `coordinates`, then a single `geojson` unwrap, then `track_points`.
//! Whatever the shape, the output mirrors the input's structure exactly;
//! only elevation fields are added.

use std::ops::Range;

use geojson::{Feature, FeatureCollection, Value as GeoJsonValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DemError, Result};
use crate::sampler::Sampler;

/// Property holding the per-feature elevation array (GeoJSON) and the
/// per-point elevation scalar (coordinate lists).
pub const GROUND_ELEVATION: &str = "ground_elevation";

/// Field appended to every track point.
pub const TERRAIN_ELEVATION: &str = "terrain_elevation";

/// A bare coordinate, `{"lat": …, "lon": …}`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CoordinatePoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// The closed set of recognized input shapes.
enum ElevationInput {
    FeatureCollection(FeatureCollection),
    Coordinates(Vec<CoordinatePoint>),
    TrackPoints(Vec<TrackPoint>),
}

/// One validated track point: its position plus every original field.
struct TrackPoint {
    lat: f64,
    lon: f64,
    fields: Map<String, Value>,
}

/// Flattened coordinates plus the descriptor needed to rebuild the shape.
struct GeometryEnvelope {
    /// `(lat, lon)` pairs in resolution order.
    coords: Vec<(f64, f64)>,
    /// Per-feature span into `coords`; `None` for features left untouched.
    spans: Vec<Option<Range<usize>>>,
}

/// Augment a request body with ground elevation.
///
/// Recognizes exactly one of the three supported shapes, resolves every
/// contained coordinate in one batch, and returns the body in its original
/// structure with elevation fields injected. Coordinates without coverage
/// get `null`, never an error.
///
/// # Errors
///
/// Returns [`DemError::InvalidInput`] when the body matches none of the
/// recognized shapes or a recognized shape is internally inconsistent.
pub fn augment(sampler: &Sampler, body: Value) -> Result<Value> {
    match sniff(body, true)? {
        ElevationInput::FeatureCollection(fc) => augment_feature_collection(sampler, fc),
        ElevationInput::Coordinates(points) => Ok(augment_coordinates(sampler, &points)),
        ElevationInput::TrackPoints(points) => Ok(augment_track_points(sampler, points)),
    }
}

/// Ordered shape sniffing. `unwrap_nested` permits one `geojson` unwrap.
fn sniff(body: Value, unwrap_nested: bool) -> Result<ElevationInput> {
    let is_feature_collection = body
        .as_object()
        .is_some_and(|obj| obj.get("type").and_then(Value::as_str) == Some("FeatureCollection"));

    if is_feature_collection {
        let fc: FeatureCollection = serde_json::from_value(body)
            .map_err(|e| DemError::invalid_input(format!("malformed FeatureCollection: {e}")))?;
        return Ok(ElevationInput::FeatureCollection(fc));
    }

    let Value::Object(mut obj) = body else {
        return Err(DemError::invalid_input(
            "request body must be a JSON object matching a recognized shape",
        ));
    };

    if let Some(coords) = obj.remove("coordinates") {
        let points: Vec<CoordinatePoint> = serde_json::from_value(coords)
            .map_err(|e| DemError::invalid_input(format!("malformed coordinate list: {e}")))?;
        return Ok(ElevationInput::Coordinates(points));
    }

    if unwrap_nested {
        if let Some(inner) = obj.remove("geojson") {
            return sniff(inner, false);
        }
    }

    if let Some(points) = obj.remove("track_points") {
        return Ok(ElevationInput::TrackPoints(parse_track_points(points)?));
    }

    Err(DemError::invalid_input(
        "expected a GeoJSON FeatureCollection, a coordinate list, or track points",
    ))
}

/// Validate the track-point schema: each element is an object with a
/// `timestamp` and a numeric position; every other field rides along.
fn parse_track_points(points: Value) -> Result<Vec<TrackPoint>> {
    let Value::Array(items) = points else {
        return Err(DemError::invalid_input("track_points must be an array"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let Value::Object(fields) = item else {
                return Err(DemError::invalid_input(format!(
                    "track point {i} must be an object"
                )));
            };
            if !fields.contains_key("timestamp") {
                return Err(DemError::invalid_input(format!(
                    "track point {i} is missing a timestamp"
                )));
            }
            let lat = fields.get("lat").and_then(Value::as_f64).ok_or_else(|| {
                DemError::invalid_input(format!("track point {i} is missing a numeric lat"))
            })?;
            let lon = fields.get("lon").and_then(Value::as_f64).ok_or_else(|| {
                DemError::invalid_input(format!("track point {i} is missing a numeric lon"))
            })?;
            Ok(TrackPoint { lat, lon, fields })
        })
        .collect()
}

/// Flatten augmentable feature geometries into one coordinate sequence.
///
/// Point, LineString and MultiLineString geometries contribute coordinates;
/// any other geometry (or a feature without one) is skipped and passes
/// through unmodified. MultiLineString component lines are concatenated in
/// order; sub-line boundaries are not preserved in the elevation array,
/// which is the established wire contract.
fn flatten_features(features: &[Feature]) -> Result<GeometryEnvelope> {
    let mut coords = Vec::new();
    let mut spans = Vec::with_capacity(features.len());

    for feature in features {
        let start = coords.len();
        let augmentable = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(GeoJsonValue::Point(position)) => {
                push_position(&mut coords, position)?;
                true
            }
            Some(GeoJsonValue::LineString(line)) => {
                for position in line {
                    push_position(&mut coords, position)?;
                }
                true
            }
            Some(GeoJsonValue::MultiLineString(lines)) => {
                for line in lines {
                    for position in line {
                        push_position(&mut coords, position)?;
                    }
                }
                true
            }
            _ => false,
        };
        spans.push(augmentable.then(|| start..coords.len()));
    }

    Ok(GeometryEnvelope { coords, spans })
}

/// GeoJSON positions are `[lon, lat, …]`.
fn push_position(coords: &mut Vec<(f64, f64)>, position: &[f64]) -> Result<()> {
    if position.len() < 2 {
        return Err(DemError::invalid_input(
            "GeoJSON position must have at least 2 elements",
        ));
    }
    coords.push((position[1], position[0]));
    Ok(())
}

fn elevation_value(elevation: Option<f64>) -> Value {
    match elevation {
        Some(v) => Value::from(v),
        None => Value::Null,
    }
}

fn augment_feature_collection(sampler: &Sampler, mut fc: FeatureCollection) -> Result<Value> {
    let envelope = flatten_features(&fc.features)?;
    let elevations = sampler.sample_batch(&envelope.coords);

    for (feature, span) in fc.features.iter_mut().zip(&envelope.spans) {
        if let Some(span) = span {
            let values: Vec<Value> = elevations[span.clone()]
                .iter()
                .map(|e| elevation_value(*e))
                .collect();
            feature
                .properties
                .get_or_insert_with(Map::new)
                .insert(GROUND_ELEVATION.to_string(), Value::Array(values));
        }
    }

    Ok(serde_json::to_value(&fc)?)
}

fn augment_coordinates(sampler: &Sampler, points: &[CoordinatePoint]) -> Value {
    let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.lat, p.lon)).collect();
    let elevations = sampler.sample_batch(&coords);

    let augmented: Vec<Value> = points
        .iter()
        .zip(&elevations)
        .map(|(point, elevation)| {
            let mut entry = Map::new();
            entry.insert("lat".to_string(), Value::from(point.lat));
            entry.insert("lon".to_string(), Value::from(point.lon));
            entry.insert(GROUND_ELEVATION.to_string(), elevation_value(*elevation));
            Value::Object(entry)
        })
        .collect();

    let mut body = Map::new();
    body.insert("coordinates".to_string(), Value::Array(augmented));
    Value::Object(body)
}

fn augment_track_points(sampler: &Sampler, points: Vec<TrackPoint>) -> Value {
    let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.lat, p.lon)).collect();
    let elevations = sampler.sample_batch(&coords);

    let augmented: Vec<Value> = points
        .into_iter()
        .zip(&elevations)
        .map(|(point, elevation)| {
            let mut fields = point.fields;
            fields.insert(TERRAIN_ELEVATION.to_string(), elevation_value(*elevation));
            Value::Object(fields)
        })
        .collect();

    let mut body = Map::new();
    body.insert("track_points".to_string(), Value::Array(augmented));
    Value::Object(body)
}
