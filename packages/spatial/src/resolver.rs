//! Hierarchical point-in-polygon resolver.
//!
//! Per tier, matching is two-stage: the store's composite bounds index
//! yields the small candidate set whose rectangles contain the point
//! (typically single digits), then each candidate's geometry is parsed and
//! tested exactly. Bounds are a conservative superset of the geometry, so
//! the pre-filter can never drop a true match.

use atlas_content_models::{AdminEntity, ResolvedBoundaries, Tier};
use atlas_content_database::catalog;
use atlas_content_geometry::GeometryError;
use switchy_database::Database;

use crate::{SpatialError, validate_coordinates};

/// Returns every active entity, across all four tiers, whose geometry
/// contains the point. Tiers are queried concurrently and reported
/// broadest-first.
///
/// Stored geometry is stripped from the results unless `include_geometry`
/// is set.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidCoordinates`] for out-of-range input and
/// propagates store failures. Per-candidate geometry errors are logged and
/// that candidate dropped; they never fail the query.
pub async fn resolve(
    db: &dyn Database,
    lat: f64,
    lon: f64,
    include_geometry: bool,
) -> Result<ResolvedBoundaries, SpatialError> {
    validate_coordinates(lat, lon)?;

    let (sovereign_states, countries, map_units, map_subunits) = futures::try_join!(
        find_containing(db, Tier::SovereignState, lat, lon, include_geometry),
        find_containing(db, Tier::Country, lat, lon, include_geometry),
        find_containing(db, Tier::MapUnit, lat, lon, include_geometry),
        find_containing(db, Tier::MapSubunit, lat, lon, include_geometry),
    )?;

    Ok(ResolvedBoundaries {
        sovereign_states,
        countries,
        map_units,
        map_subunits,
    })
}

/// The two-stage containment test for a single tier.
///
/// # Errors
///
/// Propagates store failures.
pub async fn find_containing(
    db: &dyn Database,
    tier: Tier,
    lat: f64,
    lon: f64,
    include_geometry: bool,
) -> Result<Vec<AdminEntity>, SpatialError> {
    let candidates = catalog::admin_candidates_at(db, tier, lat, lon).await?;

    let mut matches = Vec::new();
    for mut entity in candidates {
        let geometry = match atlas_content_geometry::parse(&entity.common.geometry) {
            Ok(geometry) => geometry,
            // Rows without geometry are listable but never containable.
            Err(GeometryError::Empty) => continue,
            Err(e) => {
                log::warn!(
                    "Dropping {} candidate {}: {e}",
                    tier.collection().key(),
                    entity.common.id
                );
                continue;
            }
        };

        if atlas_content_geometry::contains(&geometry, lon, lat) {
            if !include_geometry {
                entity.common.geometry.clear();
            }
            matches.push(entity);
        }
    }

    Ok(matches)
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

    fn tier_doc(
        id: &str,
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "name": id,
            "bounds": {
                "min_lat": min_lat, "max_lat": max_lat,
                "min_lon": min_lon, "max_lon": max_lon
            },
            "geometry": rect_geometry(min_lon, min_lat, max_lon, max_lat),
            "is_active": true
        })
    }

    async fn seeded_db() -> Box<dyn Database> {
        let db = db::open_in_memory().expect("in-memory sqlite");
        run_migrations(db.as_ref()).await.expect("migrations");

        // A sovereign state covering the continental USA, a country row for
        // the same landmass, and two subunits: a mainland plus an exclave
        // whose bounds overlap the mainland but whose geometry does not.
        documents::insert(
            db.as_ref(),
            Collection::SovereignStates,
            &tier_doc("united_states", 25.0, 49.0, -125.0, -66.0),
        )
        .await
        .unwrap();
        documents::insert(
            db.as_ref(),
            Collection::Countries,
            &tier_doc("united_states", 25.0, 49.0, -125.0, -66.0),
        )
        .await
        .unwrap();
        documents::insert(
            db.as_ref(),
            Collection::MapSubunits,
            &tier_doc("usa_mainland", 25.0, 49.0, -125.0, -66.0),
        )
        .await
        .unwrap();

        // Bounds contain NYC but the geometry is far west: the exact step
        // must reject it.
        let mut decoy = tier_doc("usa_decoy", 25.0, 49.0, -125.0, -66.0);
        decoy["geometry"] = json!(rect_geometry(-125.0, 25.0, -110.0, 49.0));
        documents::insert(db.as_ref(), Collection::MapSubunits, &decoy)
            .await
            .unwrap();

        // Geometry-less rows are listable but never resolve.
        let mut bare = tier_doc("usa_bare", 25.0, 49.0, -125.0, -66.0);
        bare["geometry"] = json!("");
        documents::insert(db.as_ref(), Collection::MapUnits, &bare)
            .await
            .unwrap();

        // Corrupt geometry is dropped, not fatal.
        let mut corrupt = tier_doc("usa_corrupt", 25.0, 49.0, -125.0, -66.0);
        corrupt["geometry"] = json!("{broken");
        documents::insert(db.as_ref(), Collection::MapUnits, &corrupt)
            .await
            .unwrap();

        db
    }

    #[tokio::test]
    async fn resolves_all_matching_tiers() {
        let db = seeded_db().await;
        let resolved = resolve(db.as_ref(), 40.7128, -74.0060, false).await.unwrap();

        assert_eq!(resolved.sovereign_states.len(), 1);
        assert_eq!(resolved.sovereign_states[0].common.id, "united_states");
        assert_eq!(resolved.countries.len(), 1);
        assert!(resolved.map_units.is_empty());
        assert_eq!(resolved.map_subunits.len(), 1);
        assert_eq!(resolved.map_subunits[0].common.id, "usa_mainland");
    }

    #[tokio::test]
    async fn exact_step_rejects_bounds_only_candidates() {
        let db = seeded_db().await;

        // NYC is inside the decoy's bounds but not its geometry.
        let matches = find_containing(db.as_ref(), Tier::MapSubunit, 40.7128, -74.0060, false)
            .await
            .unwrap();
        assert!(matches.iter().all(|e| e.common.id != "usa_decoy"));

        // A point in the decoy's western geometry matches both subunits.
        let west = find_containing(db.as_ref(), Tier::MapSubunit, 40.0, -115.0, false)
            .await
            .unwrap();
        let ids: Vec<&str> = west.iter().map(|e| e.common.id.as_str()).collect();
        assert!(ids.contains(&"usa_mainland"));
        assert!(ids.contains(&"usa_decoy"));
    }

    #[tokio::test]
    async fn geometry_is_stripped_unless_requested() {
        let db = seeded_db().await;

        let stripped = resolve(db.as_ref(), 40.7128, -74.0060, false).await.unwrap();
        assert!(stripped.sovereign_states[0].common.geometry.is_empty());

        let kept = resolve(db.as_ref(), 40.7128, -74.0060, true).await.unwrap();
        assert!(!kept.sovereign_states[0].common.geometry.is_empty());
    }

    #[tokio::test]
    async fn invalid_coordinates_are_rejected() {
        let db = seeded_db().await;
        assert!(matches!(
            resolve(db.as_ref(), 91.0, 0.0, false).await,
            Err(SpatialError::InvalidCoordinates { .. })
        ));
        assert!(matches!(
            resolve(db.as_ref(), 0.0, -181.0, false).await,
            Err(SpatialError::InvalidCoordinates { .. })
        ));
    }

    #[tokio::test]
    async fn ocean_point_resolves_to_nothing() {
        let db = seeded_db().await;
        let resolved = resolve(db.as_ref(), 0.0, -30.0, false).await.unwrap();
        assert!(resolved.is_empty());
    }

    /// The two-stage pipeline must agree with a brute-force scan of every
    /// active document.
    #[tokio::test]
    async fn two_stage_matches_brute_force() {
        let db = seeded_db().await;

        let probes = [
            (40.7128, -74.0060),
            (40.0, -115.0),
            (26.0, -124.0),
            (49.0, -66.0),
            (0.0, -30.0),
            (51.5, -0.1),
        ];

        for tier in Tier::ALL {
            let all_docs = documents::query_by(db.as_ref(), tier.collection(), &[], 10_000)
                .await
                .unwrap();

            for (lat, lon) in probes {
                let mut expected: Vec<String> = all_docs
                    .iter()
                    .filter_map(|doc| {
                        let geometry = doc.get("geometry")?.as_str()?;
                        let parsed = atlas_content_geometry::parse(geometry).ok()?;
                        atlas_content_geometry::contains(&parsed, lon, lat)
                            .then(|| doc["id"].as_str().unwrap_or_default().to_string())
                    })
                    .collect();
                expected.sort();

                let mut actual: Vec<String> =
                    find_containing(db.as_ref(), tier, lat, lon, false)
                        .await
                        .unwrap()
                        .into_iter()
                        .map(|e| e.common.id)
                        .collect();
                actual.sort();

                assert_eq!(actual, expected, "tier {tier:?} at ({lat}, {lon})");
            }
        }
    }
}
