//! CropLink Backend
//!
//! REST backend for the farmer/distributor directory: profiles, crop lists, location and
//! distance search, and the active session.

mod api;
mod config;
mod crops;
mod db;
mod errors;
mod models;
mod search;
mod session;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{RecordSource, Repository};
use models::{DirectoryRecord, Distributor, Farmer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CropLink Backend");
    tracing::info!("Store backend: {:?}", config.store);
    tracing::info!("Bind address: {}", config.bind_addr);

    let repo = Arc::new(Repository::open(&config).await?);
    let app = create_router(AppState { repo });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes for one directory collection.
fn directory_routes<R>() -> Router<AppState>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    Router::new()
        .route(
            "/",
            get(api::list_records::<R>).post(api::create_record::<R>),
        )
        .route("/crops", get(api::list_crops::<R>))
        .route("/search", get(api::search_records::<R>))
        .route(
            "/{id}",
            get(api::get_record::<R>)
                .put(api::update_record::<R>)
                .delete(api::delete_record::<R>),
        )
        .route("/{id}/crops", post(api::add_crop::<R>))
        .route(
            "/{id}/crops/{index}",
            put(api::rename_crop::<R>).delete(api::remove_crop::<R>),
        )
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/farmers", directory_routes::<Farmer>())
        .nest("/distributors", directory_routes::<Distributor>())
        .route("/search", get(api::search_directory))
        .route(
            "/session",
            get(api::get_session)
                .put(api::update_session)
                .delete(api::clear_session),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
