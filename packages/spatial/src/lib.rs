#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial core of the atlas content service.
//!
//! Three coupled subsystems:
//!
//! - [`resolver`] — hierarchical point-in-polygon across the four Natural
//!   Earth tiers, using the store's bounds index as a candidate pre-filter
//!   before exact geometry tests.
//! - [`coastline`] — land/ocean classification, distance to the nearest
//!   known coastline, and the grid-resolution recommendation derived from
//!   both.
//! - [`enrichment`] — the bulk pipeline that composes the two per grid
//!   square for the core grid service.

pub mod coastline;
pub mod enrichment;
pub mod resolver;

use atlas_content_database::DbError;
use thiserror::Error;

/// Hard cap on bulk inputs. Shared by batch classification and batch
/// enrichment; it is the service's primary backpressure mechanism.
pub const MAX_BATCH_POINTS: usize = 1_000;

/// Errors from the spatial subsystems.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Latitude or longitude outside the WGS84 range.
    #[error("invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// A bulk input exceeded [`MAX_BATCH_POINTS`].
    #[error("batch of {len} points exceeds the {MAX_BATCH_POINTS}-point limit")]
    BatchTooLarge { len: usize },

    /// The coastline collection produced no candidates for the point.
    #[error("no coastline data available")]
    NoCoastData,

    /// Store failure, propagated.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Validates a WGS84 coordinate pair. `NaN` fails both range checks.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidCoordinates`] when either component is
/// out of range.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), SpatialError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(SpatialError::InvalidCoordinates { lat, lon })
    }
}
