//! Coastline classifier.
//!
//! Answers land-vs-ocean and distance-to-nearest-coast, then derives the
//! grid resolution the core grid service should use at that location.
//!
//! Land detection is exact: the same two-stage containment test as the
//! administrative resolver, run against the `land_polygons` collection.
//! When that collection holds no data, a point within 1 km of a coastline
//! counts as land instead.

use atlas_content_models::{
    Classification, CoastDistance, Coordinates, GridResolution, SurfaceType,
};
use atlas_content_database::catalog;
use atlas_content_geometry::GeometryError;
use futures::stream::{self, StreamExt as _, TryStreamExt as _};
use switchy_database::Database;

use crate::{MAX_BATCH_POINTS, SpatialError, validate_coordinates};

/// Concurrent in-flight classifications during a batch.
const BATCH_CONCURRENCY: usize = 16;

/// Below this coast distance a point counts as land when no land-polygon
/// data is available.
const LAND_FALLBACK_COAST_KM: f64 = 1.0;

/// Ocean points farther than this from any coast get the coarsest grid.
const OPEN_OCEAN_THRESHOLD_KM: f64 = 1_000.0;

/// Distance from a point to the nearest known coastline.
///
/// Candidates are coastline segments whose bounds, expanded by ~2°, enclose
/// the point; the distance to each is the haversine distance to the
/// centroid of its bounds.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidCoordinates`] for out-of-range input and
/// [`SpatialError::NoCoastData`] when no candidate segment exists.
pub async fn distance_to_coast(
    db: &dyn Database,
    lat: f64,
    lon: f64,
) -> Result<CoastDistance, SpatialError> {
    validate_coordinates(lat, lon)?;

    let segments = catalog::coastline_candidates_near(db, lat, lon).await?;

    // TODO: replace the bounds-centroid proxy with true point-to-polyline
    // distance against the segment geometry.
    let mut nearest: Option<CoastDistance> = None;
    for segment in segments {
        let (center_lat, center_lon) = segment.bounds.center();
        let distance_km = atlas_content_geometry::haversine_km(lat, lon, center_lat, center_lon);

        if nearest.map_or(true, |n| distance_km < n.distance_to_coast_km) {
            nearest = Some(CoastDistance {
                distance_to_coast_km: distance_km,
                nearest_coast_point: Coordinates::new(center_lat, center_lon),
            });
        }
    }

    nearest.ok_or(SpatialError::NoCoastData)
}

/// Exact land detection: whether any active land polygon contains the
/// point. Two-stage, like the administrative resolver.
///
/// # Errors
///
/// Propagates store failures.
pub async fn point_on_land(db: &dyn Database, lat: f64, lon: f64) -> Result<bool, SpatialError> {
    let candidates = catalog::land_polygon_candidates_at(db, lat, lon).await?;

    for polygon in candidates {
        let geometry = match atlas_content_geometry::parse(&polygon.geometry) {
            Ok(geometry) => geometry,
            Err(GeometryError::Empty) => continue,
            Err(e) => {
                log::warn!("Dropping land polygon {}: {e}", polygon.id);
                continue;
            }
        };
        if atlas_content_geometry::contains(&geometry, lon, lat) {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Classifies a point as land or ocean with its coast distance and grid
/// resolution.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidCoordinates`], [`SpatialError::NoCoastData`]
/// when the coastline collection has no candidate for the point, or a store
/// failure.
pub async fn classify(db: &dyn Database, lat: f64, lon: f64) -> Result<Classification, SpatialError> {
    validate_coordinates(lat, lon)?;

    let distance = distance_to_coast(db, lat, lon).await?;

    let is_land = if catalog::has_land_polygons(db).await? {
        point_on_land(db, lat, lon).await?
    } else {
        distance.distance_to_coast_km < LAND_FALLBACK_COAST_KM
    };

    Ok(Classification {
        surface: if is_land {
            SurfaceType::Land
        } else {
            SurfaceType::Ocean
        },
        distance_to_coast_km: distance.distance_to_coast_km,
        grid_resolution: resolution_for(is_land, distance.distance_to_coast_km),
    })
}

/// Classifies up to [`MAX_BATCH_POINTS`] points, preserving input order.
///
/// # Errors
///
/// Returns [`SpatialError::BatchTooLarge`] over the cap; any per-point
/// failure fails the whole batch (no partial results).
pub async fn batch_classify(
    db: &dyn Database,
    points: &[Coordinates],
) -> Result<Vec<Classification>, SpatialError> {
    if points.len() > MAX_BATCH_POINTS {
        return Err(SpatialError::BatchTooLarge { len: points.len() });
    }

    stream::iter(points.iter().map(|point| classify(db, point.lat, point.lon)))
        .buffered(BATCH_CONCURRENCY)
        .try_collect()
        .await
}

/// The grid-resolution recommendation for a classified point.
///
/// Land always gets `1x1km` (`100x100m` is reserved for urban-density
/// input, which this service does not consume). Ocean resolution depends on
/// coast distance.
#[must_use]
pub fn resolution_for(is_land: bool, distance_to_coast_km: f64) -> GridResolution {
    if is_land {
        GridResolution::Land
    } else if distance_to_coast_km > OPEN_OCEAN_THRESHOLD_KM {
        GridResolution::OpenOcean
    } else {
        GridResolution::CoastalOcean
    }
}
