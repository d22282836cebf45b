#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the atlas content server.
//!
//! These types carry the snake_case wire format the service exposes. They
//! are separate from the stored-record types so the API contract can evolve
//! independently of the store.

use atlas_content_models::{
    Achievement, Bounds, Coordinates, PointLookup, Rarity, SquareEnrichment,
};
use serde::{Deserialize, Serialize};

/// Query parameters accepted by the tier list endpoints. Filters that do
/// not apply to the requested tier are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Maximum number of results (default 50).
    pub limit: Option<u32>,
    /// Restrict to children of this sovereign state.
    pub sovereign_state: Option<String>,
    /// Restrict to children of this country.
    pub country: Option<String>,
    /// Restrict to children of this map unit.
    pub map_unit: Option<String>,
}

/// Query parameters for `GET /landmarks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandmarkListParams {
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub limit: Option<u32>,
}

/// Query parameters for `GET /restaurants`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantListParams {
    pub country: Option<String>,
    pub cuisine: Option<String>,
    pub limit: Option<u32>,
}

/// Query parameters for `GET /landmarks/nearby`.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lon: f64,
    /// Search radius in meters (default 1000).
    pub radius: Option<f64>,
    /// Maximum number of results (default 20).
    pub limit: Option<usize>,
}

/// A `lat`/`lon` query-string pair.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointParams {
    pub lat: f64,
    pub lon: f64,
}

/// Query parameters for `GET /countries/bulk`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkCountriesParams {
    /// Passed through to the response unchanged.
    pub user_id: Option<String>,
}

/// Body of `POST /boundaries/batch-lookup`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchLookupRequest {
    pub points: Vec<PointLookup>,
    /// Run the coastline classifier for points no boundary matched.
    #[serde(default)]
    pub include_coastline: bool,
}

/// Response of `POST /boundaries/batch-lookup`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchLookupResponse {
    pub results: Vec<SquareEnrichment>,
}

/// Body of `POST /coastline/batch-classify`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchClassifyRequest {
    pub points: Vec<Coordinates>,
}

/// A landmark row in the `GET /landmarks/nearby` response, annotated with
/// its exact distance from the queried point.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyLandmark {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Coordinates,
    pub precision_radius_meters: u32,
    pub distance_meters: i64,
    pub achievement: Achievement,
    pub short_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visiting_info: Option<serde_json::Value>,
}

/// A country polygon row in the `GET /polygons/*` responses. Geometry is
/// the stored GeoJSON text, verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct CountryPolygon {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub continent: String,
    pub bounds: Bounds,
    pub geometry: String,
}

/// One row of `GET /achievements/definitions`: a landmark or restaurant
/// achievement projected into the catalog shape.
#[derive(Debug, Clone, Serialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub points: i64,
    pub rarity: Rarity,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    pub precision_radius_meters: u32,
    pub unlock_message: String,
}

/// Builds a `{<key>: items, count: n}` listing envelope.
///
/// # Panics
///
/// Never panics in practice; serialization of the service's response types
/// is infallible.
#[must_use]
pub fn envelope<T: Serialize>(key: &str, items: &[T]) -> serde_json::Value {
    let mut map = serde_json::Map::with_capacity(2);
    map.insert(
        key.to_string(),
        serde_json::to_value(items).unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
    );
    map.insert("count".to_string(), serde_json::Value::from(items.len()));
    serde_json::Value::Object(map)
}
