#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the atlas content service.
//!
//! Serves the hierarchical boundary resolver, the coastline classifier,
//! the bulk square-enrichment endpoint, and the read-only catalogs
//! (administrative tiers, landmarks, restaurants, polygons, achievement
//! definitions) over a single port.
//!
//! Request path: logger → CORS → service gate → handler. The gate checks
//! the `X-Service-Auth` shared secret in constant time; `OPTIONS`
//! preflight, `/health`, and `/metrics` bypass it. The content store is a
//! shared long-lived handle; handlers never write to it.

pub mod auth;
pub mod config;
pub mod error;
mod handlers;

use std::sync::Arc;
use std::time::Instant;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{App, HttpServer, middleware, web};
use switchy_database::Database;

use crate::auth::ServiceGate;
use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    /// Content-store connection. Read-only at request time.
    pub db: Arc<dyn Database>,
    /// Immutable service configuration.
    pub config: ServiceConfig,
    /// Process start time, for the uptime metric.
    pub started_at: Instant,
}

/// Registers every route. Shared between [`run_server`] and the test
/// harness.
///
/// Registration order matters where a literal segment shares a prefix with
/// a parameterized one (`/countries/bulk` before `/countries/{id}`).
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(handlers::metrics))
        .route(
            "/sovereign-states",
            web::get().to(handlers::list_sovereign_states),
        )
        .route(
            "/sovereign-states/{id}/countries",
            web::get().to(handlers::sovereign_state_countries),
        )
        .route(
            "/sovereign-states/{id}",
            web::get().to(handlers::get_sovereign_state),
        )
        .route("/countries/bulk", web::get().to(handlers::bulk_countries))
        .route(
            "/countries/{id}/map-units",
            web::get().to(handlers::country_map_units),
        )
        .service(
            web::resource("/countries")
                .route(web::get().to(handlers::list_countries))
                .route(web::post().to(handlers::create_stub)),
        )
        .route("/countries/{id}", web::get().to(handlers::get_country))
        .route("/map-units", web::get().to(handlers::list_map_units))
        .route(
            "/map-units/{id}/subunits",
            web::get().to(handlers::map_unit_subunits),
        )
        .route("/map-units/{id}", web::get().to(handlers::get_map_unit))
        .route("/map-subunits", web::get().to(handlers::list_map_subunits))
        .route(
            "/map-subunits/{id}",
            web::get().to(handlers::get_map_subunit),
        )
        .route(
            "/landmarks/nearby",
            web::get().to(handlers::landmarks_nearby),
        )
        .service(
            web::resource("/landmarks")
                .route(web::get().to(handlers::list_landmarks))
                .route(web::post().to(handlers::create_stub)),
        )
        .route("/landmarks/{id}", web::get().to(handlers::get_landmark))
        .route(
            "/restaurants/michelin",
            web::get().to(handlers::michelin_restaurants),
        )
        .route("/restaurants", web::get().to(handlers::list_restaurants))
        .route(
            "/boundaries/containing",
            web::get().to(handlers::boundaries_containing),
        )
        .route(
            "/boundaries/batch-lookup",
            web::post().to(handlers::batch_lookup),
        )
        .route("/boundaries", web::post().to(handlers::create_stub))
        .route(
            "/coastline/classify",
            web::get().to(handlers::coastline_classify),
        )
        .route(
            "/coastline/distance",
            web::get().to(handlers::coastline_distance),
        )
        .route(
            "/coastline/batch-classify",
            web::post().to(handlers::coastline_batch_classify),
        )
        .route(
            "/polygons/country/{id}",
            web::get().to(handlers::polygon_country),
        )
        .route(
            "/polygons/continent/{continent}",
            web::get().to(handlers::polygons_continent),
        )
        .route("/polygons/world", web::get().to(handlers::polygons_world))
        .route(
            "/achievements/definitions",
            web::get().to(handlers::achievement_definitions),
        );
}

/// Builds the CORS middleware from the configured origin.
///
/// Allowed methods, headers, and the one-hour preflight cache match what
/// the web app and the sibling core service send.
#[must_use]
pub fn cors(allowed_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(allowed_origin)
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .allowed_header(auth::AUTH_HEADER)
        .max_age(3600)
}

/// Starts the atlas content API server.
///
/// Connects to the content store, applies migrations (idempotent; they
/// provision the bounds index the resolver depends on), and serves until
/// shutdown.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if configuration is incomplete or the store connection fails.
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServiceConfig::from_env().expect("Service configuration is incomplete");
    log::info!(
        "Using content store {}/{}",
        config.project_id,
        config.database_name
    );

    log::info!("Connecting to content store...");
    let db = atlas_content_database::db::connect_from_env()
        .await
        .expect("Failed to connect to content store");

    log::info!("Running migrations...");
    atlas_content_database::run_migrations(db.as_ref())
        .await
        .expect("Failed to run migrations");

    let bind_addr = config.bind_addr.clone();
    let port = config.port;
    let allowed_origin = config.cors_allowed_origin.clone();
    let secret = config.secret.clone();

    let state = web::Data::new(AppState {
        db: Arc::from(db),
        config,
        started_at: Instant::now(),
    });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(ServiceGate::new(secret.clone()))
            .wrap(cors(&allowed_origin))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Shared fixture for the end-to-end tests in this crate: a seeded
/// in-memory store, a test configuration, and the full middleware stack
/// (gate + CORS + routes) as served in production.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Instant;

    use actix_web::body::MessageBody;
    use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
    use actix_web::{App, Error, web};
    use atlas_content_database::{db, documents, run_migrations};
    use atlas_content_models::Collection;
    use serde_json::json;
    use switchy_database::Database;

    use crate::auth::ServiceGate;
    use crate::config::ServiceConfig;
    use crate::{AppState, cors, routes};

    pub const TEST_ORIGIN: &str = "https://app.test";

    pub fn rect_geometry(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> String {
        format!(
            r#"{{"type":"Polygon","coordinates":[[[{min_lon},{min_lat}],[{max_lon},{min_lat}],[{max_lon},{max_lat}],[{min_lon},{max_lat}],[{min_lon},{min_lat}]]]}}"#
        )
    }

    #[allow(clippy::too_many_lines)]
    async fn seed_fixture(db: &dyn Database) {
        let sovereigns = [
            json!({
                "id": "united_states",
                "name": "United States",
                "continent": "North America",
                "flag_url": "flags/us.svg",
                "bounds": {"min_lat": 25.0, "max_lat": 49.0, "min_lon": -125.0, "max_lon": -66.0},
                "geometry": rect_geometry(-125.0, 25.0, -66.0, 49.0),
                "is_active": true
            }),
            json!({
                "id": "united_kingdom",
                "name": "United Kingdom",
                "continent": "Europe",
                "flag_url": "flags/gb.svg",
                "bounds": {"min_lat": 49.9, "max_lat": 60.9, "min_lon": -8.6, "max_lon": 1.8},
                "geometry": rect_geometry(-8.6, 49.9, 1.8, 60.9),
                "is_active": true
            }),
            json!({
                "id": "france",
                "name": "France",
                "continent": "Europe",
                "flag_url": "https://example.com/flags/fr.svg",
                "bounds": {"min_lat": 41.3, "max_lat": 51.1, "min_lon": -5.1, "max_lon": 9.6},
                "geometry": rect_geometry(-5.1, 41.3, 9.6, 51.1),
                "is_active": true
            }),
            json!({
                "id": "atlantis",
                "name": "Atlantis",
                "bounds": {"min_lat": 30.0, "max_lat": 32.0, "min_lon": -40.0, "max_lon": -38.0},
                "is_active": false
            }),
        ];
        for doc in &sovereigns {
            documents::insert(db, Collection::SovereignStates, doc).await.unwrap();
        }

        let countries = [
            json!({
                "id": "united_states",
                "name": "United States",
                "sovereign_state_id": "united_states",
                "continent": "North America",
                "bounds": {"min_lat": 25.0, "max_lat": 49.0, "min_lon": -125.0, "max_lon": -66.0},
                "geometry": rect_geometry(-125.0, 25.0, -66.0, 49.0),
                "is_active": true
            }),
            json!({
                "id": "scotland",
                "name": "Scotland",
                "sovereign_state_id": "united_kingdom",
                "continent": "Europe",
                "bounds": {"min_lat": 54.6, "max_lat": 60.9, "min_lon": -8.6, "max_lon": -0.7},
                "geometry": rect_geometry(-8.6, 54.6, -0.7, 60.9),
                "is_active": true
            }),
            json!({
                "id": "france",
                "name": "France",
                "sovereign_state_id": "france",
                "continent": "Europe",
                "bounds": {"min_lat": 41.3, "max_lat": 51.1, "min_lon": -5.1, "max_lon": 9.6},
                "geometry": rect_geometry(-5.1, 41.3, 9.6, 51.1),
                "is_active": true
            }),
            // Listable but shapeless: excluded from every polygon output.
            json!({
                "id": "no_shape",
                "name": "No Shape",
                "sovereign_state_id": "united_states",
                "bounds": {"min_lat": 0.0, "max_lat": 1.0, "min_lon": 0.0, "max_lon": 1.0},
                "geometry": "",
                "is_active": true
            }),
            json!({
                "id": "ghost_country",
                "name": "Ghost Country",
                "bounds": {"min_lat": 0.0, "max_lat": 1.0, "min_lon": 0.0, "max_lon": 1.0},
                "geometry": rect_geometry(0.0, 0.0, 1.0, 1.0),
                "is_active": false
            }),
        ];
        for doc in &countries {
            documents::insert(db, Collection::Countries, doc).await.unwrap();
        }

        documents::insert(
            db,
            Collection::MapSubunits,
            &json!({
                "id": "new_york_city",
                "name": "New York City",
                "sovereign_state_id": "united_states",
                "country_id": "united_states",
                "resolution_requirement": "100m",
                "bounds": {"min_lat": 40.4, "max_lat": 41.0, "min_lon": -74.3, "max_lon": -73.7},
                "geometry": rect_geometry(-74.3, 40.4, -73.7, 41.0),
                "is_active": true
            }),
        )
        .await
        .unwrap();

        let landmarks = [
            json!({
                "id": "statue_of_liberty",
                "name": "Statue of Liberty",
                "type": "monument",
                "category": "unesco",
                "coordinates": {"lat": 40.6892, "lon": -74.0445},
                "precision_radius_meters": 100,
                "country_id": "united_states",
                "short_description": "Colossal neoclassical statue in New York Harbor",
                "achievement": {
                    "id": "ach_lady_liberty",
                    "title": "Lady Liberty",
                    "description": "Visit the Statue of Liberty",
                    "points": 50,
                    "rarity": "rare",
                    "category": "landmarks",
                    "unlock_message": "You visited the Statue of Liberty!"
                },
                "is_active": true
            }),
            json!({
                "id": "eiffel_tower",
                "name": "Eiffel Tower",
                "type": "monument",
                "category": "architecture",
                "coordinates": {"lat": 48.8584, "lon": 2.2945},
                "precision_radius_meters": 150,
                "country_id": "france",
                "achievement": {"id": "ach_eiffel", "title": "Iron Lady", "points": 40, "rarity": "uncommon"},
                "is_active": true
            }),
            json!({
                "id": "ghost_landmark",
                "name": "Ghost Landmark",
                "coordinates": {"lat": 0.0, "lon": 0.0},
                "is_active": false
            }),
        ];
        for doc in &landmarks {
            documents::insert(db, Collection::Landmarks, doc).await.unwrap();
        }

        let restaurants = [
            json!({
                "id": "le_bernardin",
                "name": "Le Bernardin",
                "type": "fine_dining",
                "cuisine_type": "seafood",
                "coordinates": {"lat": 40.7614, "lon": -73.9818},
                "precision_radius_meters": 50,
                "country_id": "united_states",
                "michelin": {"stars": 3, "year_awarded": 2005, "guide": "New York"},
                "achievement": {"id": "ach_bernardin", "title": "Three Stars", "points": 75, "rarity": "legendary"},
                "is_active": true
            }),
            json!({
                "id": "chip_shop",
                "name": "The Chip Shop",
                "cuisine_type": "british",
                "coordinates": {"lat": 55.9533, "lon": -3.1883},
                "country_id": "scotland",
                "achievement": {"id": "ach_chips", "title": "Proper Chips", "points": 10},
                "is_active": true
            }),
        ];
        for doc in &restaurants {
            documents::insert(db, Collection::Restaurants, doc).await.unwrap();
        }

        let coastlines = [
            // Centroid sits in New York Harbor.
            json!({
                "id": "us_east_coast",
                "bounds": {"min_lat": 40.4, "max_lat": 41.0, "min_lon": -74.4, "max_lon": -73.6},
                "is_active": true
            }),
            // Centroid at (40, -70), off the continental shelf.
            json!({
                "id": "georges_bank",
                "bounds": {"min_lat": 39.0, "max_lat": 41.0, "min_lon": -71.0, "max_lon": -69.0},
                "is_active": true
            }),
        ];
        for doc in &coastlines {
            documents::insert(db, Collection::Coastlines, doc).await.unwrap();
        }

        // Land ends at the seaboard: the harbor point is on land, (40, -70)
        // is open water.
        documents::insert(
            db,
            Collection::LandPolygons,
            &json!({
                "id": "north_america",
                "bounds": {"min_lat": 25.0, "max_lat": 49.0, "min_lon": -125.0, "max_lon": -73.5},
                "geometry": rect_geometry(-125.0, 25.0, -73.5, 49.0),
                "is_active": true
            }),
        )
        .await
        .unwrap();
    }

    pub async fn test_state(secret: Option<&str>) -> web::Data<AppState> {
        let store = db::open_in_memory().expect("in-memory sqlite");
        run_migrations(store.as_ref()).await.expect("migrations");
        seed_fixture(store.as_ref()).await;

        web::Data::new(AppState {
            db: Arc::from(store),
            config: ServiceConfig {
                project_id: "test-project".to_string(),
                database_name: "atlas-content".to_string(),
                secret: secret.map(ToString::to_string),
                cors_allowed_origin: TEST_ORIGIN.to_string(),
                cdn_base_url: "https://cdn.test".to_string(),
                bind_addr: "127.0.0.1".to_string(),
                port: 0,
            },
            started_at: Instant::now(),
        })
    }

    /// The production middleware stack over the test state, ready for
    /// `test::init_service`.
    pub fn build_app(
        state: &web::Data<AppState>,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(ServiceGate::new(state.config.secret.clone()))
            .wrap(cors(&state.config.cors_allowed_origin))
            .app_data(state.clone())
            .configure(routes)
    }
}
