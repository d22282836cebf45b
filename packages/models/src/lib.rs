#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared record types for the atlas content service.
//!
//! These types mirror the documents stored in the external content store
//! (snake_case wire format) and the products of the spatial pipeline. They
//! are separate from the HTTP request/response types in the server's models
//! crate so the API contract can evolve independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Coordinates & bounds
// ---------------------------------------------------------------------------

/// A WGS84 coordinate pair with an optional altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees (-90 to 90).
    pub lat: f64,
    /// Longitude in decimal degrees (-180 to 180).
    pub lon: f64,
    /// Altitude in meters, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            altitude: None,
        }
    }
}

/// A closed axis-aligned latitude/longitude rectangle.
///
/// Bounds are a conservative over-approximation of an entity's geometry:
/// every vertex of the geometry lies inside them. That property is what
/// makes the bounds pre-filter of the spatial resolver a filter rather than
/// a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Whether the rectangle contains the point (closed on all edges).
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// The rectangle grown by `margin_deg` degrees in every direction.
    #[must_use]
    pub fn expanded(&self, margin_deg: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin_deg,
            max_lat: self.max_lat + margin_deg,
            min_lon: self.min_lon - margin_deg,
            max_lon: self.max_lon + margin_deg,
        }
    }

    /// The center of the rectangle as `(lat, lon)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Collections & tiers
// ---------------------------------------------------------------------------

/// A named collection in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    SovereignStates,
    Countries,
    MapUnits,
    MapSubunits,
    Landmarks,
    Restaurants,
    Coastlines,
    LandPolygons,
}

impl Collection {
    /// The collection's key in the store.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SovereignStates => "sovereign_states",
            Self::Countries => "countries",
            Self::MapUnits => "map_units",
            Self::MapSubunits => "map_subunits",
            Self::Landmarks => "landmarks",
            Self::Restaurants => "restaurants",
            Self::Coastlines => "coastlines",
            Self::LandPolygons => "land_polygons",
        }
    }
}

/// One of the four Natural Earth administrative tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    SovereignState,
    Country,
    MapUnit,
    MapSubunit,
}

impl Tier {
    /// All tiers, broadest first. Spatial results are always reported in
    /// this order.
    pub const ALL: [Self; 4] = [
        Self::SovereignState,
        Self::Country,
        Self::MapUnit,
        Self::MapSubunit,
    ];

    /// The store collection backing this tier.
    #[must_use]
    pub const fn collection(self) -> Collection {
        match self {
            Self::SovereignState => Collection::SovereignStates,
            Self::Country => Collection::Countries,
            Self::MapUnit => Collection::MapUnits,
            Self::MapSubunit => Collection::MapSubunits,
        }
    }

    /// The plural key used for `{items, count}` envelopes.
    #[must_use]
    pub const fn plural_key(self) -> &'static str {
        match self {
            Self::SovereignState => "sovereign_states",
            Self::Country => "countries",
            Self::MapUnit => "map_units",
            Self::MapSubunit => "map_subunits",
        }
    }

    /// The singular label used for boundary group output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SovereignState => "sovereign_state",
            Self::Country => "country",
            Self::MapUnit => "map_unit",
            Self::MapSubunit => "map_subunit",
        }
    }

    /// Decodes a stored document into an [`AdminEntity`] for this tier.
    ///
    /// The document itself does not say which tier it belongs to; the
    /// collection it was read from does, so decoding is tier-directed.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if the document is missing required
    /// fields or has mismatched types.
    pub fn decode_entity(self, doc: &serde_json::Value) -> Result<AdminEntity, serde_json::Error> {
        let common = AdminCommon::deserialize(doc)?;
        let metadata = match self {
            Self::SovereignState => {
                TierMetadata::SovereignState(SovereignStateMeta::deserialize(doc)?)
            }
            Self::Country => TierMetadata::Country(CountryMeta::deserialize(doc)?),
            Self::MapUnit => TierMetadata::MapUnit(MapUnitMeta::deserialize(doc)?),
            Self::MapSubunit => TierMetadata::MapSubunit(MapSubunitMeta::deserialize(doc)?),
        };
        Ok(AdminEntity {
            tier: self,
            common,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Administrative entities
// ---------------------------------------------------------------------------

/// The structural core shared by every administrative tier document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCommon {
    /// Stable string key, unique within the tier's collection.
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub official_name: String,
    /// Conservative bounding rectangle of the geometry.
    pub bounds: Bounds,
    /// GeoJSON geometry text. Empty means the row is listable but excluded
    /// from point-in-polygon queries.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub geometry: String,
    /// Grid resolution this boundary demands of the core grid service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_requirement: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Passport-issuing sovereign entity metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SovereignStateMeta {
    #[serde(default)]
    pub iso_alpha2: String,
    #[serde(default)]
    pub iso_alpha3: String,
    #[serde(default)]
    pub iso_numeric: i64,
    #[serde(default)]
    pub flag_url: String,
    #[serde(default)]
    pub flag_emoji: String,
    #[serde(default)]
    pub capital: String,
    #[serde(default)]
    pub population: i64,
    #[serde(default)]
    pub area_km2: f64,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub continent: String,
}

/// Distinct-country metadata. A country may be a sub-unit of a sovereign
/// state (Scotland within the United Kingdom).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryMeta {
    #[serde(default)]
    pub sovereign_state_id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub iso_alpha2: String,
    #[serde(default)]
    pub iso_alpha3: String,
    #[serde(default)]
    pub capital: String,
    #[serde(default)]
    pub population: i64,
    #[serde(default)]
    pub area_km2: f64,
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub flag_url: String,
}

/// Dependency/territory metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapUnitMeta {
    #[serde(default)]
    pub sovereign_state_id: String,
    #[serde(default)]
    pub country_id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub admin_level: String,
    #[serde(default)]
    pub iso_alpha2: String,
    #[serde(default)]
    pub iso_alpha3: String,
    #[serde(default)]
    pub population: i64,
    #[serde(default)]
    pub area_km2: f64,
}

/// Non-contiguous region metadata (mainland vs islands).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapSubunitMeta {
    #[serde(default)]
    pub sovereign_state_id: String,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub map_unit_id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub admin_level: String,
    #[serde(default)]
    pub is_mainland: bool,
    #[serde(default)]
    pub population: i64,
    #[serde(default)]
    pub area_km2: f64,
}

/// Tier-specific metadata carried alongside [`AdminCommon`].
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TierMetadata {
    SovereignState(SovereignStateMeta),
    Country(CountryMeta),
    MapUnit(MapUnitMeta),
    MapSubunit(MapSubunitMeta),
}

/// An administrative entity from one of the four Natural Earth tiers.
///
/// Serializes flat (common core and tier metadata at one level), matching
/// the stored document shape. Construct via [`Tier::decode_entity`].
#[derive(Debug, Clone, Serialize)]
pub struct AdminEntity {
    #[serde(skip)]
    pub tier: Tier,
    #[serde(flatten)]
    pub common: AdminCommon,
    #[serde(flatten)]
    pub metadata: TierMetadata,
}

impl AdminEntity {
    /// The parent sovereign state id, for tiers that carry one.
    #[must_use]
    pub fn sovereign_state_id(&self) -> Option<&str> {
        match &self.metadata {
            TierMetadata::SovereignState(_) => None,
            TierMetadata::Country(m) => Some(&m.sovereign_state_id),
            TierMetadata::MapUnit(m) => Some(&m.sovereign_state_id),
            TierMetadata::MapSubunit(m) => Some(&m.sovereign_state_id),
        }
    }

    /// The continent name, for tiers that carry one.
    #[must_use]
    pub fn continent(&self) -> Option<&str> {
        match &self.metadata {
            TierMetadata::SovereignState(m) => Some(&m.continent),
            TierMetadata::Country(m) => Some(&m.continent),
            TierMetadata::MapUnit(_) | TierMetadata::MapSubunit(_) => None,
        }
    }

    /// The flag asset URL, for tiers that carry one.
    #[must_use]
    pub fn flag_url(&self) -> Option<&str> {
        match &self.metadata {
            TierMetadata::SovereignState(m) => Some(&m.flag_url),
            TierMetadata::Country(m) => Some(&m.flag_url),
            TierMetadata::MapUnit(_) | TierMetadata::MapSubunit(_) => None,
        }
    }
}

/// The spatial resolver's product: every entity whose geometry contains the
/// queried point, grouped by tier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedBoundaries {
    pub sovereign_states: Vec<AdminEntity>,
    pub countries: Vec<AdminEntity>,
    pub map_units: Vec<AdminEntity>,
    pub map_subunits: Vec<AdminEntity>,
}

impl ResolvedBoundaries {
    /// Tier groups, broadest first.
    #[must_use]
    pub fn groups(&self) -> [(Tier, &[AdminEntity]); 4] {
        [
            (Tier::SovereignState, self.sovereign_states.as_slice()),
            (Tier::Country, self.countries.as_slice()),
            (Tier::MapUnit, self.map_units.as_slice()),
            (Tier::MapSubunit, self.map_subunits.as_slice()),
        ]
    }

    /// All matched entities in tier order (broadest first).
    pub fn iter(&self) -> impl Iterator<Item = &AdminEntity> {
        self.sovereign_states
            .iter()
            .chain(&self.countries)
            .chain(&self.map_units)
            .chain(&self.map_subunits)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sovereign_states.is_empty()
            && self.countries.is_empty()
            && self.map_units.is_empty()
            && self.map_subunits.is_empty()
    }

    /// The most specific match (subunit before unit before country before
    /// sovereign state), when any tier matched.
    #[must_use]
    pub fn most_specific(&self) -> Option<&AdminEntity> {
        self.map_subunits
            .first()
            .or_else(|| self.map_units.first())
            .or_else(|| self.countries.first())
            .or_else(|| self.sovereign_states.first())
    }
}

// ---------------------------------------------------------------------------
// Landmarks, restaurants & achievements
// ---------------------------------------------------------------------------

/// Achievement rarity classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// An achievement embedded in a landmark or restaurant document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unlock_message: String,
}

/// A point of interest with an achievement trigger radius.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub official_name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category: String,
    pub coordinates: Coordinates,
    /// Achievement trigger radius in whole meters.
    #[serde(default)]
    pub precision_radius_meters: u32,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub state_id: String,
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visiting_info: Option<serde_json::Value>,
    #[serde(default)]
    pub achievement: Achievement,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Michelin recognition for a restaurant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Michelin {
    #[serde(default)]
    pub stars: u8,
    #[serde(default)]
    pub year_awarded: i32,
    #[serde(default)]
    pub guide: String,
    #[serde(default)]
    pub description: String,
}

/// A dining establishment with a required achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub cuisine_type: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub precision_radius_meters: u32,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub state_id: String,
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub michelin: Option<Michelin>,
    #[serde(default)]
    pub achievement: Achievement,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Coastline & land polygons
// ---------------------------------------------------------------------------

/// A coastline segment used for distance-to-coast computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoastlineSegment {
    pub id: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub geometry: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A land-mass polygon used for exact land detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandPolygon {
    pub id: String,
    pub bounds: Bounds,
    #[serde(default)]
    pub geometry: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Classification & enrichment products
// ---------------------------------------------------------------------------

/// Grid cell size recommended to the core grid service at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridResolution {
    #[serde(rename = "100x100m")]
    Urban,
    #[serde(rename = "1x1km")]
    Land,
    #[serde(rename = "10x10km")]
    CoastalOcean,
    #[serde(rename = "100x100km")]
    OpenOcean,
}

impl GridResolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urban => "100x100m",
            Self::Land => "1x1km",
            Self::CoastalOcean => "10x10km",
            Self::OpenOcean => "100x100km",
        }
    }
}

/// Land vs ocean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceType {
    Land,
    Ocean,
}

/// The coastline classifier's product for a single point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub surface: SurfaceType,
    pub distance_to_coast_km: f64,
    pub grid_resolution: GridResolution,
}

/// Distance to the nearest known coastline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoastDistance {
    pub distance_to_coast_km: f64,
    pub nearest_coast_point: Coordinates,
}

/// One grid-square centroid submitted for bulk enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointLookup {
    pub lat: f64,
    pub lon: f64,
    pub square_id: String,
}

/// The enrichment product for one grid square.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquareEnrichment {
    pub square_id: String,
    pub boundary_tags: Vec<String>,
    pub resolution: String,
    pub landmarks_nearby: Vec<String>,
}

/// One row of the deduplicated country universe served to bulk consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCountry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub flag_url: String,
    /// Whether this country's sovereign state differs from itself.
    pub is_territory: bool,
    /// Resolved name of the owning sovereign state; `null` for sovereigns.
    pub sovereign_state_name: Option<String>,
}
