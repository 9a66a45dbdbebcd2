//! Entre Server - Visitor Check-in Kiosk System
//!
//! A Rust REST API server for visitor check-in/check-out.

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use entre_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("entre_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Entre Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.kiosk.clone());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Wizard sessions
        .route("/sessions", post(api::sessions::create_session))
        .route("/sessions/:id", get(api::sessions::get_session))
        .route("/sessions/:id/type", post(api::sessions::select_type))
        .route("/sessions/:id/visitors", post(api::sessions::submit_visitors))
        .route("/sessions/:id/host", post(api::sessions::select_host))
        .route("/sessions/:id/terms", post(api::sessions::accept_terms))
        .route("/sessions/:id/back", post(api::sessions::back))
        .route("/sessions/:id/close", post(api::sessions::close))
        .route(
            "/sessions/:id/check-out/start",
            post(api::sessions::start_check_out),
        )
        .route(
            "/sessions/:id/check-out",
            post(api::sessions::commit_check_out),
        )
        // Visitors
        .route("/visitors", post(api::visitors::check_in))
        .route("/visitors/active", get(api::visitors::list_active))
        .route("/visitors/history", get(api::visitors::list_history))
        .route("/visitors/events", get(api::visitors::events))
        .route(
            "/visitors/frequent-names",
            get(api::visitors::frequent_names),
        )
        .route("/visitors/:id/check-out", post(api::visitors::check_out))
        // Hosts
        .route("/hosts", get(api::hosts::list_hosts))
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
