//! Typed accessors over the document store.
//!
//! Every function decodes stored documents into the shared record types,
//! skipping documents that are missing required fields. A malformed
//! document is logged and dropped; it never fails the query.

use atlas_content_models::{
    AdminEntity, Bounds, Collection, CoastlineSegment, LandPolygon, Landmark, Restaurant, Tier,
};
use serde::Deserialize as _;
use serde::de::DeserializeOwned;
use switchy_database::Database;

use crate::documents::{self, Filter};
use crate::DbError;

/// Degrees of slack added around coastline segment bounds when gathering
/// distance candidates.
pub const COASTLINE_BOUNDS_MARGIN_DEG: f64 = 2.0;

fn decode_all<T: DeserializeOwned>(
    collection: Collection,
    docs: Vec<serde_json::Value>,
) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match T::deserialize(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed {} document: {e}", collection.key());
                None
            }
        })
        .collect()
}

fn decode_admin(tier: Tier, docs: Vec<serde_json::Value>) -> Vec<AdminEntity> {
    docs.iter()
        .filter_map(|doc| match tier.decode_entity(doc) {
            Ok(entity) => Some(entity),
            Err(e) => {
                log::warn!(
                    "Skipping malformed {} document: {e}",
                    tier.collection().key()
                );
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Administrative tiers
// ---------------------------------------------------------------------------

/// Fetches one administrative entity by id, active or not.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn admin_by_id(
    db: &dyn Database,
    tier: Tier,
    id: &str,
) -> Result<Option<AdminEntity>, DbError> {
    let Some(doc) = documents::get(db, tier.collection(), id).await? else {
        return Ok(None);
    };

    match tier.decode_entity(&doc) {
        Ok(entity) => Ok(Some(entity)),
        Err(e) => {
            log::warn!("Skipping malformed {} document {id}: {e}", tier.collection().key());
            Ok(None)
        }
    }
}

/// Lists active administrative entities matching the filters, up to `limit`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_admin(
    db: &dyn Database,
    tier: Tier,
    filters: &[Filter],
    limit: u32,
) -> Result<Vec<AdminEntity>, DbError> {
    let docs = documents::query_by(db, tier.collection(), filters, limit).await?;
    Ok(decode_admin(tier, docs))
}

/// Returns the active entities of a tier whose bounds rectangle contains
/// the point — the candidate step of the two-stage resolver.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn admin_candidates_at(
    db: &dyn Database,
    tier: Tier,
    lat: f64,
    lon: f64,
) -> Result<Vec<AdminEntity>, DbError> {
    let docs = documents::query_by_bounds(db, tier.collection(), lat, lon, 0.0).await?;
    Ok(decode_admin(tier, docs))
}

// ---------------------------------------------------------------------------
// Landmarks & restaurants
// ---------------------------------------------------------------------------

/// Fetches one landmark by id, active or not.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn landmark_by_id(db: &dyn Database, id: &str) -> Result<Option<Landmark>, DbError> {
    let Some(doc) = documents::get(db, Collection::Landmarks, id).await? else {
        return Ok(None);
    };

    match Landmark::deserialize(&doc) {
        Ok(landmark) => Ok(Some(landmark)),
        Err(e) => {
            log::warn!("Skipping malformed landmarks document {id}: {e}");
            Ok(None)
        }
    }
}

/// Lists active landmarks matching the filters, up to `limit`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_landmarks(
    db: &dyn Database,
    filters: &[Filter],
    limit: u32,
) -> Result<Vec<Landmark>, DbError> {
    let docs = documents::query_by(db, Collection::Landmarks, filters, limit).await?;
    Ok(decode_all(Collection::Landmarks, docs))
}

/// Returns active landmarks whose coordinates fall inside the envelope.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn landmarks_in_envelope(
    db: &dyn Database,
    envelope: &Bounds,
    limit: u32,
) -> Result<Vec<Landmark>, DbError> {
    let docs = documents::query_in_envelope(db, Collection::Landmarks, envelope, limit).await?;
    Ok(decode_all(Collection::Landmarks, docs))
}

/// Lists active restaurants matching the filters, up to `limit`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_restaurants(
    db: &dyn Database,
    filters: &[Filter],
    limit: u32,
) -> Result<Vec<Restaurant>, DbError> {
    let docs = documents::query_by(db, Collection::Restaurants, filters, limit).await?;
    Ok(decode_all(Collection::Restaurants, docs))
}

// ---------------------------------------------------------------------------
// Coastlines & land polygons
// ---------------------------------------------------------------------------

/// Returns coastline segments whose bounds, expanded by
/// [`COASTLINE_BOUNDS_MARGIN_DEG`], enclose the point.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn coastline_candidates_near(
    db: &dyn Database,
    lat: f64,
    lon: f64,
) -> Result<Vec<CoastlineSegment>, DbError> {
    let docs = documents::query_by_bounds(
        db,
        Collection::Coastlines,
        lat,
        lon,
        COASTLINE_BOUNDS_MARGIN_DEG,
    )
    .await?;
    Ok(decode_all(Collection::Coastlines, docs))
}

/// Returns land polygons whose bounds contain the point — the candidate
/// step of exact land detection.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn land_polygon_candidates_at(
    db: &dyn Database,
    lat: f64,
    lon: f64,
) -> Result<Vec<LandPolygon>, DbError> {
    let docs = documents::query_by_bounds(db, Collection::LandPolygons, lat, lon, 0.0).await?;
    Ok(decode_all(Collection::LandPolygons, docs))
}

/// Whether any active land polygons exist. When none do, the coastline
/// classifier falls back to distance-based land detection.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn has_land_polygons(db: &dyn Database) -> Result<bool, DbError> {
    documents::has_any(db, Collection::LandPolygons).await
}
