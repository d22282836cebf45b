//! Service configuration, read once at startup and immutable thereafter.

/// Default port; the sibling core grid service owns 8082.
pub const DEFAULT_PORT: u16 = 8083;

const DEFAULT_DATABASE_NAME: &str = "atlas-content";
const DEFAULT_CORS_ORIGIN: &str = "https://atlas-web-app.example.com";
const DEFAULT_CDN_BASE_URL: &str = "https://cdn.atlas-content.example.com";

/// Errors from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PROJECT_ID environment variable is required")]
    MissingProjectId,
}

/// Immutable service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Cloud project the content store lives in.
    pub project_id: String,
    /// Logical database name within the project.
    pub database_name: String,
    /// Shared secret for the service gate. `None` disables authentication
    /// (local development).
    pub secret: Option<String>,
    /// Origin allowed by CORS.
    pub cors_allowed_origin: String,
    /// Base URL that relative flag asset paths are resolved against.
    pub cdn_base_url: String,
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl ServiceConfig {
    /// Loads configuration from the environment.
    ///
    /// `PROJECT_ID` is required; `SERVICE_SECRET`, `CORS_ALLOWED_ORIGIN`,
    /// `CDN_BASE_URL`, `DATABASE_NAME`, `BIND_ADDR`, and `PORT` are
    /// optional with documented defaults. An empty `SERVICE_SECRET`
    /// disables the gate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProjectId`] when `PROJECT_ID` is
    /// absent or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let project_id = non_empty_var("PROJECT_ID").ok_or(ConfigError::MissingProjectId)?;

        Ok(Self {
            project_id,
            database_name: non_empty_var("DATABASE_NAME")
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            secret: non_empty_var("SERVICE_SECRET"),
            cors_allowed_origin: non_empty_var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            cdn_base_url: non_empty_var("CDN_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CDN_BASE_URL.to_string()),
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty_var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
