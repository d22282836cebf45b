//! Bulk square-enrichment pipeline.
//!
//! Consumes batches of grid-square centroids from the core grid service and
//! produces boundary tags, a resolution class, and a nearby-landmark
//! shortlist per point. Points are processed concurrently under a bounded
//! cap; the response always preserves input order. Any per-point store
//! failure fails the whole batch — no partial results.

use atlas_content_models::{PointLookup, ResolvedBoundaries, SquareEnrichment};
use atlas_content_database::catalog;
use futures::stream::{self, StreamExt as _, TryStreamExt as _};
use switchy_database::Database;

use crate::{MAX_BATCH_POINTS, SpatialError, coastline, resolver};

/// Concurrent in-flight points during a batch.
const BATCH_CONCURRENCY: usize = 16;

/// Envelope half-width used for the nearby-landmark shortlist.
const LANDMARK_RADIUS_METERS: f64 = 1_000.0;

/// Cap on the per-square landmark shortlist.
const MAX_NEARBY_LANDMARKS: u32 = 20;

/// Resolution class when no matched boundary demands one.
const DEFAULT_RESOLUTION: &str = "1km";

/// Per-batch options.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnrichOptions {
    /// Run the coastline classifier for points no boundary matched. Off by
    /// default; the classifier doubles the store traffic per miss.
    pub include_coastline: bool,
}

/// Enriches up to [`MAX_BATCH_POINTS`] grid squares, preserving input
/// order.
///
/// # Errors
///
/// Returns [`SpatialError::BatchTooLarge`] over the cap,
/// [`SpatialError::InvalidCoordinates`] for any out-of-range point, and
/// store failures (whole-batch).
pub async fn enrich(
    db: &dyn Database,
    points: &[PointLookup],
    options: EnrichOptions,
) -> Result<Vec<SquareEnrichment>, SpatialError> {
    if points.len() > MAX_BATCH_POINTS {
        return Err(SpatialError::BatchTooLarge { len: points.len() });
    }

    stream::iter(points.iter().map(|point| enrich_point(db, point, options)))
        .buffered(BATCH_CONCURRENCY)
        .try_collect()
        .await
}

async fn enrich_point(
    db: &dyn Database,
    point: &PointLookup,
    options: EnrichOptions,
) -> Result<SquareEnrichment, SpatialError> {
    let resolved = resolver::resolve(db, point.lat, point.lon, false).await?;

    let boundary_tags = boundary_tags(&resolved);

    let mut resolution = resolved
        .most_specific()
        .and_then(|entity| entity.common.resolution_requirement.clone())
        .unwrap_or_else(|| DEFAULT_RESOLUTION.to_string());

    if options.include_coastline && resolved.is_empty() {
        match coastline::classify(db, point.lat, point.lon).await {
            Ok(classification) => {
                resolution = classification.grid_resolution.as_str().to_string();
            }
            // A grid square in a dataset without coastlines keeps the
            // default resolution rather than failing the batch.
            Err(SpatialError::NoCoastData) => {}
            Err(e) => return Err(e),
        }
    }

    let envelope =
        atlas_content_geometry::bounding_box(point.lat, point.lon, LANDMARK_RADIUS_METERS);
    let landmarks = catalog::landmarks_in_envelope(db, &envelope, MAX_NEARBY_LANDMARKS).await?;
    let landmarks_nearby = landmarks.into_iter().map(|landmark| landmark.id).collect();

    Ok(SquareEnrichment {
        square_id: point.square_id.clone(),
        boundary_tags,
        resolution,
        landmarks_nearby,
    })
}

/// Lower-cased names of every matched entity, broadest tier first. An
/// entity with no name falls back to its id, which is unique per
/// collection.
fn boundary_tags(resolved: &ResolvedBoundaries) -> Vec<String> {
    resolved
        .iter()
        .map(|entity| {
            if entity.common.name.is_empty() {
                entity.common.id.to_lowercase()
            } else {
                entity.common.name.to_lowercase()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_content_database::{db, documents, run_migrations};
    use atlas_content_models::Collection;
    use serde_json::json;

    fn rect_geometry(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> String {
        format!(
            r#"{{"type":"Polygon","coordinates":[[[{min_lon},{min_lat}],[{max_lon},{min_lat}],[{max_lon},{max_lat}],[{min_lon},{max_lat}],[{min_lon},{min_lat}]]]}}"#
        )
    }

    async fn seeded_db() -> Box<dyn Database> {
        let db = db::open_in_memory().expect("in-memory sqlite");
        run_migrations(db.as_ref()).await.expect("migrations");

        documents::insert(
            db.as_ref(),
            Collection::SovereignStates,
            &json!({
                "id": "united_states",
                "name": "United States",
                "bounds": {"min_lat": 25.0, "max_lat": 49.0, "min_lon": -125.0, "max_lon": -66.0},
                "geometry": rect_geometry(-125.0, 25.0, -66.0, 49.0),
                "is_active": true
            }),
        )
        .await
        .unwrap();

        documents::insert(
            db.as_ref(),
            Collection::Countries,
            &json!({
                "id": "united_states",
                "name": "United States",
                "sovereign_state_id": "united_states",
                "bounds": {"min_lat": 25.0, "max_lat": 49.0, "min_lon": -125.0, "max_lon": -66.0},
                "geometry": rect_geometry(-125.0, 25.0, -66.0, 49.0),
                "is_active": true
            }),
        )
        .await
        .unwrap();

        // A subunit demanding finer grid cells around the NYC area.
        documents::insert(
            db.as_ref(),
            Collection::MapSubunits,
            &json!({
                "id": "nyc_metro",
                "name": "NYC Metro",
                "resolution_requirement": "100m",
                "bounds": {"min_lat": 40.4, "max_lat": 41.0, "min_lon": -74.3, "max_lon": -73.7},
                "geometry": rect_geometry(-74.3, 40.4, -73.7, 41.0),
                "is_active": true
            }),
        )
        .await
        .unwrap();

        documents::insert(
            db.as_ref(),
            Collection::Landmarks,
            &json!({
                "id": "statue_of_liberty",
                "name": "Statue of Liberty",
                "coordinates": {"lat": 40.6892, "lon": -74.0445},
                "is_active": true
            }),
        )
        .await
        .unwrap();

        db
    }

    fn point(lat: f64, lon: f64, square_id: &str) -> PointLookup {
        PointLookup {
            lat,
            lon,
            square_id: square_id.to_string(),
        }
    }

    #[tokio::test]
    async fn preserves_input_order() {
        let db = seeded_db().await;
        let points = vec![
            point(40.7128, -74.0060, "sq_a"),
            point(48.8566, 2.3522, "sq_b"),
            point(36.0, -100.0, "sq_c"),
        ];

        let results = enrich(db.as_ref(), &points, EnrichOptions::default())
            .await
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.square_id.as_str()).collect();
        assert_eq!(ids, ["sq_a", "sq_b", "sq_c"]);
    }

    #[tokio::test]
    async fn tags_follow_tier_order() {
        let db = seeded_db().await;
        let results = enrich(
            db.as_ref(),
            &[point(40.7128, -74.0060, "nyc")],
            EnrichOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            results[0].boundary_tags,
            ["united states", "united states", "nyc metro"]
        );
    }

    #[tokio::test]
    async fn resolution_comes_from_most_specific_match() {
        let db = seeded_db().await;
        let results = enrich(
            db.as_ref(),
            &[
                point(40.7128, -74.0060, "nyc"),    // subunit demands 100m
                point(36.0, -100.0, "plains"),      // country only, defaults
                point(48.8566, 2.3522, "paris"),    // no match at all
            ],
            EnrichOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(results[0].resolution, "100m");
        assert_eq!(results[1].resolution, "1km");
        assert_eq!(results[2].resolution, "1km");
    }

    #[tokio::test]
    async fn shortlists_nearby_landmarks() {
        let db = seeded_db().await;
        let results = enrich(
            db.as_ref(),
            &[
                point(40.6892, -74.0445, "at_the_statue"),
                point(36.0, -100.0, "plains"),
            ],
            EnrichOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(results[0].landmarks_nearby, ["statue_of_liberty"]);
        assert!(results[1].landmarks_nearby.is_empty());
    }

    #[tokio::test]
    async fn rejects_oversized_batches() {
        let db = seeded_db().await;
        let points = vec![point(0.0, 0.0, "sq"); MAX_BATCH_POINTS + 1];
        assert!(matches!(
            enrich(db.as_ref(), &points, EnrichOptions::default()).await,
            Err(SpatialError::BatchTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_point_fails_the_whole_batch() {
        let db = seeded_db().await;
        let points = vec![point(40.7128, -74.0060, "good"), point(95.0, 0.0, "bad")];
        assert!(matches!(
            enrich(db.as_ref(), &points, EnrichOptions::default()).await,
            Err(SpatialError::InvalidCoordinates { .. })
        ));
    }

    #[tokio::test]
    async fn coastline_opt_in_labels_unmatched_ocean_points() {
        let db = seeded_db().await;
        documents::insert(
            db.as_ref(),
            Collection::Coastlines,
            &json!({
                "id": "mid_atlantic",
                "bounds": {"min_lat": 30.0, "max_lat": 40.0, "min_lon": -40.0, "max_lon": -30.0},
                "is_active": true
            }),
        )
        .await
        .unwrap();

        let results = enrich(
            db.as_ref(),
            &[point(35.0, -35.0, "open_sea")],
            EnrichOptions {
                include_coastline: true,
            },
        )
        .await
        .unwrap();

        // No land polygons seeded: the fallback calls anything under 1 km
        // from a coast land; the centroid sits right at the probe, so this
        // point classifies as land.
        assert_eq!(results[0].resolution, "1x1km");
        assert!(results[0].boundary_tags.is_empty());
    }
}
