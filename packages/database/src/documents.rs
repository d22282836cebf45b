//! Wire-level document operations.
//!
//! Everything here speaks the store's native shape: the `documents` table,
//! its predicate columns, and `$N`-parameterized SQL. Callers receive the
//! stored JSON documents; typed decoding lives in [`crate::catalog`].

use std::fmt::Write as _;

use atlas_content_models::{Bounds, Collection};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// An indexed equality predicate for [`query_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    SovereignStateId,
    CountryId,
    MapUnitId,
    /// The document's `type` field.
    Kind,
    Category,
    Continent,
}

impl FilterField {
    const fn column(self) -> &'static str {
        match self {
            Self::SovereignStateId => "sovereign_state_id",
            Self::CountryId => "country_id",
            Self::MapUnitId => "map_unit_id",
            Self::Kind => "kind",
            Self::Category => "category",
            Self::Continent => "continent",
        }
    }
}

/// A field/value equality filter.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: FilterField,
    pub value: String,
}

impl Filter {
    #[must_use]
    pub fn new(field: FilterField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Fetches one document by id, active or not.
///
/// Returns `None` on a miss or when the stored document does not parse as
/// JSON (logged; a detail fetch on a corrupt row reads as not-found).
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get(
    db: &dyn Database,
    collection: Collection,
    id: &str,
) -> Result<Option<serde_json::Value>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT doc FROM documents WHERE collection = $1 AND id = $2",
            &[
                DatabaseValue::String(collection.key().to_string()),
                DatabaseValue::String(id.to_string()),
            ],
        )
        .await?;

    Ok(rows.first().and_then(|row| {
        let raw: String = row.to_value("doc").unwrap_or_default();
        match serde_json::from_str(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                log::warn!("Skipping malformed {} document {id}: {e}", collection.key());
                None
            }
        }
    }))
}

/// Returns every active document whose stored bounds rectangle, expanded by
/// `margin_deg` degrees, contains `(lat, lon)`.
///
/// With `margin_deg = 0.0` this is the exact candidate predicate of the
/// two-stage resolver; the coastline classifier passes a margin to sweep in
/// nearby segments. The conjunction is served by the composite bounds index.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn query_by_bounds(
    db: &dyn Database,
    collection: Collection,
    lat: f64,
    lon: f64,
    margin_deg: f64,
) -> Result<Vec<serde_json::Value>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT doc FROM documents
             WHERE collection = $1 AND is_active = 1
               AND min_lat <= $2 AND max_lat >= $3
               AND min_lon <= $4 AND max_lon >= $5",
            &[
                DatabaseValue::String(collection.key().to_string()),
                DatabaseValue::Real64(lat + margin_deg),
                DatabaseValue::Real64(lat - margin_deg),
                DatabaseValue::Real64(lon + margin_deg),
                DatabaseValue::Real64(lon - margin_deg),
            ],
        )
        .await?;

    Ok(decode_rows(collection, &rows))
}

/// Returns active documents matching every equality filter, up to `limit`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn query_by(
    db: &dyn Database,
    collection: Collection,
    filters: &[Filter],
    limit: u32,
) -> Result<Vec<serde_json::Value>, DbError> {
    let mut sql =
        String::from("SELECT doc FROM documents WHERE collection = $1 AND is_active = 1");
    let mut params = vec![DatabaseValue::String(collection.key().to_string())];
    let mut param_idx = 2u32;

    for filter in filters {
        write!(sql, " AND {} = ${param_idx}", filter.field.column()).unwrap();
        params.push(DatabaseValue::String(filter.value.clone()));
        param_idx += 1;
    }

    write!(sql, " LIMIT ${param_idx}").unwrap();
    params.push(DatabaseValue::Int64(i64::from(limit)));

    let rows = db.query_raw_params(&sql, &params).await?;

    Ok(decode_rows(collection, &rows))
}

/// Returns active point documents whose coordinates lie inside the
/// envelope, up to `limit`.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn query_in_envelope(
    db: &dyn Database,
    collection: Collection,
    envelope: &Bounds,
    limit: u32,
) -> Result<Vec<serde_json::Value>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT doc FROM documents
             WHERE collection = $1 AND is_active = 1
               AND lat >= $2 AND lat <= $3
               AND lon >= $4 AND lon <= $5
             LIMIT $6",
            &[
                DatabaseValue::String(collection.key().to_string()),
                DatabaseValue::Real64(envelope.min_lat),
                DatabaseValue::Real64(envelope.max_lat),
                DatabaseValue::Real64(envelope.min_lon),
                DatabaseValue::Real64(envelope.max_lon),
                DatabaseValue::Int64(i64::from(limit)),
            ],
        )
        .await?;

    Ok(decode_rows(collection, &rows))
}

/// Whether the collection holds at least one active document.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn has_any(db: &dyn Database, collection: Collection) -> Result<bool, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id FROM documents WHERE collection = $1 AND is_active = 1 LIMIT 1",
            &[DatabaseValue::String(collection.key().to_string())],
        )
        .await?;

    Ok(!rows.is_empty())
}

/// Inserts (or replaces) a document, extracting the indexed predicate
/// columns from the document itself.
///
/// The service never calls this at request time; it exists for the ingest
/// pipeline and test fixtures. Extracted columns: `is_active` (default
/// true), `bounds.*`, `coordinates.lat`/`lon`, `sovereign_state_id`,
/// `country_id`, `map_unit_id`, `type`, `category`, `continent`.
///
/// # Errors
///
/// Returns [`DbError::MalformedDocument`] if the document has no string
/// `id` and [`DbError::Store`] if the write fails.
pub async fn insert(
    db: &dyn Database,
    collection: Collection,
    doc: &serde_json::Value,
) -> Result<(), DbError> {
    let id = doc
        .get("id")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| DbError::MalformedDocument {
            message: format!("{} document has no id", collection.key()),
        })?;

    let is_active = doc
        .get("is_active")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(true);

    let bounds_field = |name: &str| {
        doc.get("bounds")
            .and_then(|b| b.get(name))
            .and_then(serde_json::Value::as_f64)
            .map_or(DatabaseValue::Null, DatabaseValue::Real64)
    };
    let point_field = |name: &str| {
        doc.get("coordinates")
            .and_then(|c| c.get(name))
            .and_then(serde_json::Value::as_f64)
            .map_or(DatabaseValue::Null, DatabaseValue::Real64)
    };
    let text_field = |name: &str| {
        doc.get(name)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map_or(DatabaseValue::Null, |s| DatabaseValue::String(s.to_string()))
    };

    db.exec_raw_params(
        "INSERT INTO documents (
            collection, id, is_active,
            min_lat, max_lat, min_lon, max_lon,
            lat, lon,
            sovereign_state_id, country_id, map_unit_id,
            kind, category, continent, doc
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        &[
            DatabaseValue::String(collection.key().to_string()),
            DatabaseValue::String(id.to_string()),
            DatabaseValue::Int32(i32::from(is_active)),
            bounds_field("min_lat"),
            bounds_field("max_lat"),
            bounds_field("min_lon"),
            bounds_field("max_lon"),
            point_field("lat"),
            point_field("lon"),
            text_field("sovereign_state_id"),
            text_field("country_id"),
            text_field("map_unit_id"),
            text_field("type"),
            text_field("category"),
            text_field("continent"),
            DatabaseValue::String(doc.to_string()),
        ],
    )
    .await?;

    Ok(())
}

/// Parses the `doc` column of each row, skipping rows that do not hold
/// valid JSON. A corrupt document never fails the whole query.
fn decode_rows(
    collection: Collection,
    rows: &[switchy_database::Row],
) -> Vec<serde_json::Value> {
    rows.iter()
        .filter_map(|row| {
            let raw: String = row.to_value("doc").unwrap_or_default();
            match serde_json::from_str(&raw) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    log::warn!("Skipping malformed {} document: {e}", collection.key());
                    None
                }
            }
        })
        .collect()
}
