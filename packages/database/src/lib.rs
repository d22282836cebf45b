#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Document-store adapter for the atlas content service.
//!
//! The external content store is reached through `switchy_database`. All
//! documents live in a single `documents` table keyed `(collection, id)`:
//! the full document is a JSON `doc` column, and the predicate columns the
//! store indexes (`is_active`, bounds, point, parent ids, type, category,
//! continent) are extracted at write time.
//!
//! This crate is the only code that knows that wire shape. `documents`
//! exposes the raw operations (`get`, `query_by_bounds`, `query_by`, ...);
//! `catalog` layers typed accessors on top, skipping malformed documents
//! with a warning instead of failing the query.

pub mod catalog;
pub mod db;
pub mod documents;

use include_dir::{Dir, include_dir};
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

/// Embedded schema migrations: the `documents` table plus the bounds,
/// point, and filter indexes under `migrations/`.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Errors surfaced by the content-store adapter.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The store rejected or failed a query. Transient; callers may retry
    /// the request, the adapter itself never does.
    #[error("Store error: {0}")]
    Store(#[from] switchy_database::DatabaseError),

    /// Provisioning the documents schema failed.
    #[error("Schema error: {0}")]
    Schema(#[from] switchy_schema::MigrationError),

    /// A document could not be mapped to or from the wire shape (for
    /// reads this is usually handled by skip-and-warn instead).
    #[error("Malformed document: {message}")]
    MalformedDocument {
        /// What was missing or mistyped.
        message: String,
    },
}

/// Provisions the documents schema, applying any pending migrations.
///
/// Idempotent. The index set it creates is what keeps `query_by_bounds`
/// a candidate lookup instead of a collection scan, so this must have run
/// against a store before the resolver is pointed at it.
///
/// # Errors
///
/// Returns [`DbError::Schema`] if a migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    MigrationRunner::new(Box::new(source)).run(db).await?;
    log::info!("Content store schema is current (documents table and bounds indexes)");
    Ok(())
}
