//! HTTP handler functions for the atlas content API.

use actix_web::{HttpResponse, web};
use atlas_content_models::{BulkCountry, Landmark, Restaurant, Tier};
use atlas_content_database::catalog;
use atlas_content_database::documents::{Filter, FilterField};
use atlas_content_server_models::{
    AchievementDefinition, BatchClassifyRequest, BatchLookupRequest, BatchLookupResponse,
    BulkCountriesParams, CountryPolygon, LandmarkListParams, ListParams, NearbyLandmark,
    NearbyParams, PointParams, RestaurantListParams, envelope,
};
use atlas_content_spatial::enrichment::{self, EnrichOptions};
use atlas_content_spatial::{coastline, resolver, validate_coordinates};
use std::collections::HashMap;

use crate::AppState;
use crate::error::ApiError;

/// Default page size for list endpoints.
const DEFAULT_LIST_LIMIT: u32 = 50;

/// Ceiling for whole-catalog reads (bulk countries, world polygons,
/// achievement definitions). Far above the real collection sizes.
const CATALOG_SCAN_LIMIT: u32 = 10_000;

/// Default search radius for `GET /landmarks/nearby`, in meters.
const DEFAULT_NEARBY_RADIUS_METERS: f64 = 1_000.0;

/// Default result cap for `GET /landmarks/nearby`.
const DEFAULT_NEARBY_LIMIT: usize = 20;

const fn tier_not_found(tier: Tier) -> &'static str {
    match tier {
        Tier::SovereignState => "Sovereign state not found",
        Tier::Country => "Country not found",
        Tier::MapUnit => "Map unit not found",
        Tier::MapSubunit => "Map subunit not found",
    }
}

/// The parent filters a tier's list endpoint accepts; anything else in the
/// query string is ignored.
fn tier_filters(tier: Tier, params: &ListParams) -> Vec<Filter> {
    let mut filters = Vec::new();

    let accepts_sovereign = !matches!(tier, Tier::SovereignState);
    let accepts_country = matches!(tier, Tier::MapUnit | Tier::MapSubunit);
    let accepts_map_unit = matches!(tier, Tier::MapSubunit);

    if accepts_sovereign {
        if let Some(id) = &params.sovereign_state {
            filters.push(Filter::new(FilterField::SovereignStateId, id.clone()));
        }
    }
    if accepts_country {
        if let Some(id) = &params.country {
            filters.push(Filter::new(FilterField::CountryId, id.clone()));
        }
    }
    if accepts_map_unit {
        if let Some(id) = &params.map_unit {
            filters.push(Filter::new(FilterField::MapUnitId, id.clone()));
        }
    }

    filters
}

// ---------------------------------------------------------------------------
// Liveness & metrics
// ---------------------------------------------------------------------------

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// `GET /metrics`
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    let uptime = state.started_at.elapsed().as_secs_f64();

    let body = format!(
        "# HELP atlas_content_uptime_seconds Total uptime in seconds\n\
         # TYPE atlas_content_uptime_seconds counter\n\
         atlas_content_uptime_seconds {uptime}\n\
         \n\
         # HELP atlas_content_info Service information\n\
         # TYPE atlas_content_info gauge\n\
         atlas_content_info{{version=\"{}\",service=\"atlas-content-service\"}} 1\n",
        env!("CARGO_PKG_VERSION"),
    );

    HttpResponse::Ok().content_type("text/plain").body(body)
}

// ---------------------------------------------------------------------------
// Administrative tiers
// ---------------------------------------------------------------------------

async fn list_tier(
    state: &AppState,
    tier: Tier,
    params: &ListParams,
) -> Result<HttpResponse, ApiError> {
    let filters = tier_filters(tier, params);
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let entities = catalog::list_admin(state.db.as_ref(), tier, &filters, limit).await?;
    Ok(HttpResponse::Ok().json(envelope(tier.plural_key(), &entities)))
}

async fn get_tier(state: &AppState, tier: Tier, id: &str) -> Result<HttpResponse, ApiError> {
    match catalog::admin_by_id(state.db.as_ref(), tier, id).await? {
        Some(entity) => Ok(HttpResponse::Ok().json(entity)),
        None => Err(ApiError::NotFound(tier_not_found(tier))),
    }
}

async fn list_children(
    state: &AppState,
    tier: Tier,
    field: FilterField,
    parent_id: String,
    limit: Option<u32>,
) -> Result<HttpResponse, ApiError> {
    let filters = [Filter::new(field, parent_id)];
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let entities = catalog::list_admin(state.db.as_ref(), tier, &filters, limit).await?;
    Ok(HttpResponse::Ok().json(envelope(tier.plural_key(), &entities)))
}

/// `GET /sovereign-states`
pub async fn list_sovereign_states(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    list_tier(&state, Tier::SovereignState, &params).await
}

/// `GET /countries`
pub async fn list_countries(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    list_tier(&state, Tier::Country, &params).await
}

/// `GET /map-units`
pub async fn list_map_units(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    list_tier(&state, Tier::MapUnit, &params).await
}

/// `GET /map-subunits`
pub async fn list_map_subunits(
    state: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    list_tier(&state, Tier::MapSubunit, &params).await
}

/// `GET /sovereign-states/{id}`
pub async fn get_sovereign_state(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    get_tier(&state, Tier::SovereignState, &id).await
}

/// `GET /countries/{id}`
pub async fn get_country(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    get_tier(&state, Tier::Country, &id).await
}

/// `GET /map-units/{id}`
pub async fn get_map_unit(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    get_tier(&state, Tier::MapUnit, &id).await
}

/// `GET /map-subunits/{id}`
pub async fn get_map_subunit(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    get_tier(&state, Tier::MapSubunit, &id).await
}

/// `GET /sovereign-states/{id}/countries`
pub async fn sovereign_state_countries(
    state: web::Data<AppState>,
    id: web::Path<String>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    list_children(
        &state,
        Tier::Country,
        FilterField::SovereignStateId,
        id.into_inner(),
        params.limit,
    )
    .await
}

/// `GET /countries/{id}/map-units`
pub async fn country_map_units(
    state: web::Data<AppState>,
    id: web::Path<String>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    list_children(
        &state,
        Tier::MapUnit,
        FilterField::CountryId,
        id.into_inner(),
        params.limit,
    )
    .await
}

/// `GET /map-units/{id}/subunits`
pub async fn map_unit_subunits(
    state: web::Data<AppState>,
    id: web::Path<String>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    list_children(
        &state,
        Tier::MapSubunit,
        FilterField::MapUnitId,
        id.into_inner(),
        params.limit,
    )
    .await
}

// ---------------------------------------------------------------------------
// Bulk countries
// ---------------------------------------------------------------------------

/// `GET /countries/bulk`
///
/// The deduplicated country universe: sovereign states first, then every
/// country not already emitted, flagged as a territory when its sovereign
/// differs from itself. Map units never appear here.
pub async fn bulk_countries(
    state: web::Data<AppState>,
    params: web::Query<BulkCountriesParams>,
) -> Result<HttpResponse, ApiError> {
    let db = state.db.as_ref();

    let sovereigns =
        catalog::list_admin(db, Tier::SovereignState, &[], CATALOG_SCAN_LIMIT).await?;
    let countries = catalog::list_admin(db, Tier::Country, &[], CATALOG_SCAN_LIMIT).await?;

    let sovereign_names: HashMap<&str, &str> = sovereigns
        .iter()
        .map(|entity| (entity.common.id.as_str(), entity.common.name.as_str()))
        .collect();

    let mut emitted: Vec<BulkCountry> = Vec::with_capacity(sovereigns.len() + countries.len());

    for entity in &sovereigns {
        emitted.push(BulkCountry {
            id: entity.common.id.clone(),
            name: entity.common.name.clone(),
            continent: entity.continent().unwrap_or_default().to_string(),
            flag_url: absolutize_flag(
                &state.config.cdn_base_url,
                entity.flag_url().unwrap_or_default(),
            ),
            is_territory: false,
            sovereign_state_name: None,
        });
    }

    for entity in &countries {
        if emitted.iter().any(|row| row.id == entity.common.id) {
            continue;
        }

        let sovereign_id = entity.sovereign_state_id().unwrap_or_default();
        let is_territory = !sovereign_id.is_empty() && sovereign_id != entity.common.id;

        emitted.push(BulkCountry {
            id: entity.common.id.clone(),
            name: entity.common.name.clone(),
            continent: entity.continent().unwrap_or_default().to_string(),
            flag_url: absolutize_flag(
                &state.config.cdn_base_url,
                entity.flag_url().unwrap_or_default(),
            ),
            is_territory,
            sovereign_state_name: sovereign_names
                .get(sovereign_id)
                .map(std::string::ToString::to_string),
        });
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "countries": emitted,
        "count": emitted.len(),
        "user_id": params.user_id,
        "visited_count": 0,
    })))
}

/// Resolves a relative flag asset path against the configured CDN base.
fn absolutize_flag(cdn_base_url: &str, flag_url: &str) -> String {
    if flag_url.is_empty() || flag_url.starts_with("http://") || flag_url.starts_with("https://") {
        flag_url.to_string()
    } else {
        format!(
            "{}/{}",
            cdn_base_url.trim_end_matches('/'),
            flag_url.trim_start_matches('/')
        )
    }
}

// ---------------------------------------------------------------------------
// Landmarks & restaurants
// ---------------------------------------------------------------------------

/// `GET /landmarks`
pub async fn list_landmarks(
    state: web::Data<AppState>,
    params: web::Query<LandmarkListParams>,
) -> Result<HttpResponse, ApiError> {
    let mut filters = Vec::new();
    if let Some(country) = &params.country {
        filters.push(Filter::new(FilterField::CountryId, country.clone()));
    }
    if let Some(kind) = &params.kind {
        filters.push(Filter::new(FilterField::Kind, kind.clone()));
    }
    if let Some(category) = &params.category {
        filters.push(Filter::new(FilterField::Category, category.clone()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let landmarks = catalog::list_landmarks(state.db.as_ref(), &filters, limit).await?;
    Ok(HttpResponse::Ok().json(envelope("landmarks", &landmarks)))
}

/// `GET /landmarks/{id}`
pub async fn get_landmark(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    match catalog::landmark_by_id(state.db.as_ref(), &id).await? {
        Some(landmark) => Ok(HttpResponse::Ok().json(landmark)),
        None => Err(ApiError::NotFound("Landmark not found")),
    }
}

/// `GET /landmarks/nearby`
///
/// Bounding-box candidates from the store, re-filtered by exact haversine
/// distance. A non-positive radius matches nothing.
#[allow(clippy::cast_possible_truncation)]
pub async fn landmarks_nearby(
    state: web::Data<AppState>,
    params: web::Query<NearbyParams>,
) -> Result<HttpResponse, ApiError> {
    validate_coordinates(params.lat, params.lon)?;

    let radius = params.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_METERS);
    let limit = params.limit.unwrap_or(DEFAULT_NEARBY_LIMIT);

    if radius <= 0.0 {
        let empty: [NearbyLandmark; 0] = [];
        return Ok(HttpResponse::Ok().json(envelope("landmarks", &empty)));
    }

    let search_area = atlas_content_geometry::bounding_box(params.lat, params.lon, radius);
    // Over-fetch: the box is wider than the circle and exact filtering
    // below discards the corners.
    let candidate_limit = u32::try_from(limit.saturating_mul(2)).unwrap_or(u32::MAX);
    let candidates =
        catalog::landmarks_in_envelope(state.db.as_ref(), &search_area, candidate_limit).await?;

    let mut nearby = Vec::new();
    for landmark in candidates {
        let distance = atlas_content_geometry::haversine(
            params.lat,
            params.lon,
            landmark.coordinates.lat,
            landmark.coordinates.lon,
        );
        if distance <= radius {
            nearby.push(to_nearby(landmark, distance));
        }
        if nearby.len() >= limit {
            break;
        }
    }

    Ok(HttpResponse::Ok().json(envelope("landmarks", &nearby)))
}

#[allow(clippy::cast_possible_truncation)]
fn to_nearby(landmark: Landmark, distance_meters: f64) -> NearbyLandmark {
    NearbyLandmark {
        id: landmark.id,
        name: landmark.name,
        kind: landmark.kind,
        coordinates: landmark.coordinates,
        precision_radius_meters: landmark.precision_radius_meters,
        distance_meters: distance_meters as i64,
        achievement: landmark.achievement,
        short_description: landmark.short_description,
        visiting_info: landmark.visiting_info,
    }
}

/// `GET /restaurants`
pub async fn list_restaurants(
    state: web::Data<AppState>,
    params: web::Query<RestaurantListParams>,
) -> Result<HttpResponse, ApiError> {
    let mut filters = Vec::new();
    if let Some(country) = &params.country {
        filters.push(Filter::new(FilterField::CountryId, country.clone()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let mut restaurants = catalog::list_restaurants(state.db.as_ref(), &filters, limit).await?;
    if let Some(cuisine) = &params.cuisine {
        restaurants.retain(|restaurant| &restaurant.cuisine_type == cuisine);
    }

    Ok(HttpResponse::Ok().json(envelope("restaurants", &restaurants)))
}

/// `GET /restaurants/michelin`
pub async fn michelin_restaurants(
    state: web::Data<AppState>,
    params: web::Query<RestaurantListParams>,
) -> Result<HttpResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let mut restaurants =
        catalog::list_restaurants(state.db.as_ref(), &[], CATALOG_SCAN_LIMIT).await?;
    restaurants.retain(|restaurant| restaurant.michelin.is_some());
    restaurants.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    Ok(HttpResponse::Ok().json(envelope("restaurants", &restaurants)))
}

// ---------------------------------------------------------------------------
// Spatial endpoints
// ---------------------------------------------------------------------------

/// `GET /boundaries/containing`
pub async fn boundaries_containing(
    state: web::Data<AppState>,
    params: web::Query<PointParams>,
) -> Result<HttpResponse, ApiError> {
    let resolved = resolver::resolve(state.db.as_ref(), params.lat, params.lon, false).await?;

    let boundaries: Vec<serde_json::Value> = resolved
        .groups()
        .iter()
        .filter(|(_, entities)| !entities.is_empty())
        .map(|(tier, entities)| {
            serde_json::json!({
                "type": tier.label(),
                "entities": entities,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "lat": params.lat,
        "lon": params.lon,
        "boundaries": boundaries,
        "count": boundaries.len(),
    })))
}

/// `POST /boundaries/batch-lookup`
pub async fn batch_lookup(
    state: web::Data<AppState>,
    request: web::Json<BatchLookupRequest>,
) -> Result<HttpResponse, ApiError> {
    let options = EnrichOptions {
        include_coastline: request.include_coastline,
    };

    let results = enrichment::enrich(state.db.as_ref(), &request.points, options).await?;
    Ok(HttpResponse::Ok().json(BatchLookupResponse { results }))
}

/// `GET /coastline/classify`
pub async fn coastline_classify(
    state: web::Data<AppState>,
    params: web::Query<PointParams>,
) -> Result<HttpResponse, ApiError> {
    let result = coastline::classify(state.db.as_ref(), params.lat, params.lon).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "lat": params.lat,
        "lon": params.lon,
        "result": result,
    })))
}

/// `GET /coastline/distance`
pub async fn coastline_distance(
    state: web::Data<AppState>,
    params: web::Query<PointParams>,
) -> Result<HttpResponse, ApiError> {
    let result = coastline::distance_to_coast(state.db.as_ref(), params.lat, params.lon).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "lat": params.lat,
        "lon": params.lon,
        "result": result,
    })))
}

/// `POST /coastline/batch-classify`
pub async fn coastline_batch_classify(
    state: web::Data<AppState>,
    request: web::Json<BatchClassifyRequest>,
) -> Result<HttpResponse, ApiError> {
    let results = coastline::batch_classify(state.db.as_ref(), &request.points).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "count": results.len(),
        "results": results,
    })))
}

// ---------------------------------------------------------------------------
// Polygons
// ---------------------------------------------------------------------------

/// `GET /polygons/country/{id}`
pub async fn polygon_country(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let entity = catalog::admin_by_id(state.db.as_ref(), Tier::Country, &id).await?;

    match entity {
        Some(entity) if entity.common.is_active && !entity.common.geometry.is_empty() => {
            let polygon = CountryPolygon {
                id: entity.common.id,
                name: entity.common.name,
                continent: entity.continent().unwrap_or_default().to_string(),
                bounds: entity.common.bounds,
                geometry: entity.common.geometry,
            };
            Ok(HttpResponse::Ok().json(polygon))
        }
        _ => Err(ApiError::NotFound("Country polygon not found")),
    }
}

/// `GET /polygons/continent/{continent}`
pub async fn polygons_continent(
    state: web::Data<AppState>,
    continent: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let filters = [Filter::new(FilterField::Continent, continent.into_inner())];
    country_polygons(&state, &filters).await
}

/// `GET /polygons/world`
pub async fn polygons_world(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    country_polygons(&state, &[]).await
}

/// Country polygons only — map units and subunits would double-count the
/// same landmass. Rows without geometry are skipped.
async fn country_polygons(state: &AppState, filters: &[Filter]) -> Result<HttpResponse, ApiError> {
    let entities =
        catalog::list_admin(state.db.as_ref(), Tier::Country, filters, CATALOG_SCAN_LIMIT).await?;

    let polygons: Vec<CountryPolygon> = entities
        .into_iter()
        .filter(|entity| !entity.common.geometry.is_empty())
        .map(|entity| CountryPolygon {
            continent: entity.continent().unwrap_or_default().to_string(),
            id: entity.common.id,
            name: entity.common.name,
            bounds: entity.common.bounds,
            geometry: entity.common.geometry,
        })
        .collect();

    Ok(HttpResponse::Ok().json(envelope("polygons", &polygons)))
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// `GET /achievements/definitions`
///
/// No persisted achievements collection exists; this union of landmark and
/// restaurant achievements is the system of record for the catalog.
pub async fn achievement_definitions(
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let db = state.db.as_ref();

    let landmarks = catalog::list_landmarks(db, &[], CATALOG_SCAN_LIMIT).await?;
    let restaurants = catalog::list_restaurants(db, &[], CATALOG_SCAN_LIMIT).await?;

    let mut achievements: Vec<AchievementDefinition> =
        Vec::with_capacity(landmarks.len() + restaurants.len());
    achievements.extend(landmarks.into_iter().map(landmark_achievement));
    achievements.extend(restaurants.into_iter().map(restaurant_achievement));

    Ok(HttpResponse::Ok().json(envelope("achievements", &achievements)))
}

fn landmark_achievement(landmark: Landmark) -> AchievementDefinition {
    AchievementDefinition {
        id: landmark.achievement.id,
        title: landmark.achievement.title,
        description: landmark.achievement.description,
        points: landmark.achievement.points,
        rarity: landmark.achievement.rarity,
        category: landmark.achievement.category,
        landmark_id: Some(landmark.id),
        restaurant_id: None,
        precision_radius_meters: landmark.precision_radius_meters,
        unlock_message: landmark.achievement.unlock_message,
    }
}

fn restaurant_achievement(restaurant: Restaurant) -> AchievementDefinition {
    AchievementDefinition {
        id: restaurant.achievement.id,
        title: restaurant.achievement.title,
        description: restaurant.achievement.description,
        points: restaurant.achievement.points,
        rarity: restaurant.achievement.rarity,
        category: restaurant.achievement.category,
        landmark_id: None,
        restaurant_id: Some(restaurant.id),
        precision_radius_meters: restaurant.precision_radius_meters,
        unlock_message: restaurant.achievement.unlock_message,
    }
}

// ---------------------------------------------------------------------------
// Admin stubs
// ---------------------------------------------------------------------------

/// `POST /countries`, `POST /landmarks`, `POST /boundaries`
///
/// Writes belong to the ingest pipeline; the admin surface is reserved.
pub async fn create_stub() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotImplemented)
}
