#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pure geometry kernel for the atlas content service.
//!
//! Parses stored GeoJSON geometry text into `geo` types and answers exact
//! point-in-polygon, great-circle distance, and bounding-box questions. No
//! I/O happens here; callers hand in raw text and coordinates.
//!
//! Degree/radian conversion happens inside this crate only. Boundary
//! inclusion follows `geo::Contains` (points exactly on a ring are outside),
//! applied uniformly everywhere containment is tested.

use atlas_content_models::Bounds;
use geo::{Contains, MultiPolygon, Point};
use geojson::GeoJson;
use thiserror::Error;

/// Mean Earth radius in meters, as used by the haversine formula.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate meters per degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Errors from geometry parsing.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The geometry text was empty. Callers treat this as "no containment".
    #[error("empty geometry")]
    Empty,

    /// The text is not a GeoJSON `Polygon` or `MultiPolygon` geometry.
    #[error("invalid geometry: {0}")]
    Invalid(String),
}

/// Parses GeoJSON geometry text into a [`MultiPolygon`].
///
/// A bare `Polygon` is wrapped into a single-member `MultiPolygon`. Any
/// other geometry type (`LineString`, `GeometryCollection`, features, ...)
/// is rejected; coastline distance has its own representation and never
/// calls this.
///
/// # Errors
///
/// Returns [`GeometryError::Empty`] for empty input and
/// [`GeometryError::Invalid`] for malformed or non-areal geometry.
pub fn parse(geojson_text: &str) -> Result<MultiPolygon<f64>, GeometryError> {
    let trimmed = geojson_text.trim();
    if trimmed.is_empty() {
        return Err(GeometryError::Empty);
    }

    let geojson: GeoJson = trimmed
        .parse()
        .map_err(|e: geojson::Error| GeometryError::Invalid(e.to_string()))?;

    let GeoJson::Geometry(geometry) = geojson else {
        return Err(GeometryError::Invalid(
            "expected a GeoJSON geometry".to_string(),
        ));
    };

    let geometry: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|e: geojson::Error| GeometryError::Invalid(e.to_string()))?;

    match geometry {
        geo::Geometry::Polygon(polygon) => Ok(MultiPolygon(vec![polygon])),
        geo::Geometry::MultiPolygon(multi) => Ok(multi),
        other => Err(GeometryError::Invalid(format!(
            "unsupported geometry type: {other:?}"
        ))),
    }
}

/// Whether the geometry contains the point.
///
/// `MultiPolygon` containment is true iff any member polygon contains the
/// point; holes subtract.
#[must_use]
pub fn contains(geometry: &MultiPolygon<f64>, lon: f64, lat: f64) -> bool {
    geometry.contains(&Point::new(lon, lat))
}

/// A flat-earth bounding box of `radius_meters` around a point.
///
/// Valid for radii up to tens of kilometers; callers needing more must
/// widen the box and re-filter by exact distance.
#[must_use]
pub fn bounding_box(lat: f64, lon: f64, radius_meters: f64) -> Bounds {
    let lat_delta = radius_meters / METERS_PER_DEGREE_LAT;
    let lon_delta = radius_meters / (METERS_PER_DEGREE_LAT * lat.to_radians().cos());

    Bounds {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Great-circle distance between two points in meters.
#[must_use]
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Great-circle distance between two points in kilometers.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(lat1, lon1, lat2, lon2) / 1_000.0
}
