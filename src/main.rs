// Competition Admin API v0.1
use axum::routing::{get, patch, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use routes::AppState;
use services::cache::ResponseCache;
use services::geo::WktPointParser;
use services::open_meteo::ArchiveClient;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 1;

/// OpenAPI document for the Competition Admin API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Competition Admin API",
        version = "0.1.0",
        description = "Back-office API for a competition platform. Admins review \
            competitions submitted by organizers, follow dashboard statistics, and \
            store historical weather for past editions from the Open-Meteo archive.",
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Competitions", description = "Public approved competitions"),
        (name = "Admin", description = "Competition review and dashboard"),
        (name = "Editions", description = "Historical weather for editions"),
    ),
    paths(
        routes::health::health_check,
        routes::competitions::list_competitions,
        routes::competitions::get_competition,
        routes::admin::list_competitions,
        routes::admin::approve_competition,
        routes::admin::reject_competition,
        routes::admin::change_competition_status,
        routes::admin::get_dashboard,
        routes::editions::fetch_edition_weather,
        routes::editions::get_edition_weather,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::competitions::PublicCompetition,
            routes::admin::AdminCompetition,
            routes::admin::RejectRequest,
            routes::admin::StatusChangeRequest,
            services::admin::CompetitionStatus,
            services::admin::DashboardStats,
            routes::editions::EditionSummary,
            routes::editions::FetchWeatherResponse,
            routes::editions::EditionWeatherResponse,
            services::weather::EditionWeather,
            services::weather::TemperatureSummary,
            services::weather::WindSummary,
            services::weather::WeatherCondition,
            services::weather::CompassDirection,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "competition_admin_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    let archive_client = ArchiveClient::new(
        &config.weather_archive_url,
        Duration::from_secs(config.weather_timeout_secs),
    )
    .expect("Failed to build archive HTTP client");

    let app_state = AppState {
        pool: pool.clone(),
        archive_client,
        geo_parser: WktPointParser,
        cache: ResponseCache::new(Duration::from_secs(config.cache_ttl_secs)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
        ])
        .allow_headers(Any);

    // Public reads and admin operations share AppState; health uses the pool directly.
    let public_routes = Router::new()
        .route(
            "/api/v1/competitions",
            get(routes::competitions::list_competitions),
        )
        .route(
            "/api/v1/competitions/:id",
            get(routes::competitions::get_competition),
        );

    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/competitions",
            get(routes::admin::list_competitions),
        )
        .route(
            "/api/v1/admin/competitions/:id/approve",
            post(routes::admin::approve_competition),
        )
        .route(
            "/api/v1/admin/competitions/:id/reject",
            post(routes::admin::reject_competition),
        )
        .route(
            "/api/v1/admin/competitions/:id/status",
            patch(routes::admin::change_competition_status),
        )
        .route("/api/v1/admin/dashboard", get(routes::admin::get_dashboard))
        .route(
            "/api/v1/admin/editions/:id/weather",
            get(routes::editions::get_edition_weather).post(routes::editions::fetch_edition_weather),
        );

    let app_routes = public_routes.merge(admin_routes).with_state(app_state);

    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(pool);

    let app = Router::new()
        .merge(health_routes)
        .merge(app_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
