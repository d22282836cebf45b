//! Database connection utilities.

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::{Credentials, init_sqlite_rusqlite};

/// Default on-disk location of the content store when `DATABASE_URL` is not
/// set.
const DEFAULT_SQLITE_PATH: &str = "data/content.db";

/// Creates a new content-store connection from the `DATABASE_URL`
/// environment variable.
///
/// A `postgres://` URL connects over TLS; any other value is treated as a
/// `SQLite` file path. When the variable is absent, a local `SQLite` file at
/// `data/content.db` is used.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_from_env() -> Result<Box<dyn Database>, Box<dyn std::error::Error>> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if url.starts_with("postgres") => {
            let creds = Credentials::from_url(&url)?;
            let db = switchy_database_connection::init_postgres_raw_native_tls(creds).await?;
            Ok(db)
        }
        Ok(path) => {
            let db = init_sqlite_rusqlite(Some(Path::new(&path)))
                .map_err(|e| format!("Failed to open SQLite store at {path}: {e}"))?;
            Ok(db)
        }
        Err(_) => {
            let db = init_sqlite_rusqlite(Some(Path::new(DEFAULT_SQLITE_PATH)))
                .map_err(|e| format!("Failed to open SQLite store: {e}"))?;
            Ok(db)
        }
    }
}

/// Opens an in-memory `SQLite` store.
///
/// Used by tests and local tooling; the schema still has to be applied via
/// [`crate::run_migrations`].
///
/// # Errors
///
/// Returns an error if the in-memory database cannot be initialized.
pub fn open_in_memory() -> Result<Box<dyn Database>, Box<dyn std::error::Error>> {
    let db = init_sqlite_rusqlite(None)
        .map_err(|e| format!("Failed to open in-memory SQLite store: {e}"))?;
    Ok(db)
}
