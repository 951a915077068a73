//! Employee Notes Backend
//!
//! A REST backend over a JSON dataset file and an attachment directory, with
//! checksummed archive import/export.

mod api;
mod archive;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{AttachmentStore, Repository};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub attachments: Arc<AttachmentStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Employee Notes Backend");
    tracing::info!("Dataset path: {:?}", config.data_path);
    tracing::info!("Resources path: {:?}", config.resources_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize storage
    let (repo, attachments) = db::init_storage(&config).await?;
    let employee_count = repo.list_employees().await?.len();
    tracing::info!("Dataset loaded with {} employees", employee_count);

    // Create application state
    let state = AppState {
        repo: Arc::new(repo),
        attachments: Arc::new(attachments),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    // API routes
    let api_routes = Router::new()
        // Employees
        .route("/employees", get(api::list_employees))
        .route("/employees", post(api::create_employee))
        .route("/employees/{id}", get(api::get_employee))
        .route("/employees/{id}/notes", post(api::add_note))
        .route("/employees/{id}/praise", post(api::add_praise))
        .route("/employees/{id}/feedback", post(api::add_feedback))
        .route(
            "/employees/{id}/performance-reviews",
            post(api::add_performance_review),
        )
        // Attachments
        .route("/files/{filename}", get(api::get_file))
        // Import/export
        .route("/import-export/export", get(api::export_data))
        .route("/import-export/import", post(api::import_data));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
