//! Campus Directory Backend
//!
//! REST backend for the campus location directory, admin notifications and
//! the pharmacy back-office, persisted in SQLite.

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod errors;
mod models;
mod notifications;
mod stats;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{ChangeFeed, Repository};
use directory::LocationStore;
use notifications::{spawn_poller, LocalStore, NotificationCenter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub locations: Arc<LocationStore>,
    pub notifications: Arc<NotificationCenter>,
    pub config: Arc<Config>,
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

    tracing::info!("Starting Campus Directory Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Local state path: {:?}", config.local_state_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CAMPUS_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool, ChangeFeed::default()));

    // Populate the location store
    let locations = Arc::new(LocationStore::new());
    locations.init(&repo).await?;

    // Notification center and its background refresh
    let notifications = Arc::new(NotificationCenter::new(
        repo.clone(),
        LocalStore::new(&config.local_state_path),
    ));
    let poller = spawn_poller(notifications.clone(), repo.feed(), config.poll_interval);

    // Create application state
    let state = AppState {
        repo,
        locations: locations.clone(),
        notifications,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    poller.shutdown().await;
    locations.dispose().await;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // Public directory reads and pharmacy portal sign-in
    let public_routes = Router::new()
        .route("/directory", get(api::get_directory))
        .route("/directory/revision", get(api::get_revision))
        .route("/search", get(api::search_locations))
        .route("/categories/{category}", get(api::get_category))
        .route("/pharmacy/login", post(api::pharmacy_login))
        .route("/pharmacy/change-password", post(api::change_own_password));

    // Admin routes
    let admin_routes = Router::new()
        // Locations
        .route(
            "/locations",
            get(api::list_locations).post(api::create_location),
        )
        .route(
            "/locations/{id}",
            get(api::get_location)
                .put(api::update_location)
                .delete(api::delete_location),
        )
        // Notifications
        .route(
            "/notifications",
            get(api::list_notifications)
                .post(api::create_notification)
                .delete(api::delete_all_notifications),
        )
        .route("/notifications/read-all", post(api::mark_all_notifications_read))
        .route("/notifications/delete", post(api::delete_selected_notifications))
        .route("/notifications/{id}/read", post(api::mark_notification_read))
        // Statistics
        .route("/stats/dashboard", get(api::get_dashboard_stats))
        // Pharmacies
        .route(
            "/pharmacies",
            get(api::list_pharmacies).post(api::create_pharmacy),
        )
        .route(
            "/pharmacies/{id}",
            get(api::get_pharmacy)
                .put(api::update_pharmacy)
                .delete(api::delete_pharmacy),
        )
        .route("/pharmacies/{id}/stats", get(api::get_pharmacy_stats))
        .route("/pharmacies/{id}/stock", get(api::list_pharmacy_stock))
        .route(
            "/pharmacies/{id}/stock/{medicine_id}",
            put(api::set_pharmacy_stock).delete(api::remove_pharmacy_stock),
        )
        // Medicines
        .route(
            "/medicines",
            get(api::list_medicines).post(api::create_medicine),
        )
        .route(
            "/medicines/{id}",
            get(api::get_medicine)
                .put(api::update_medicine)
                .delete(api::delete_medicine),
        )
        // Users
        .route("/users", get(api::list_users).post(api::create_user))
        .route(
            "/users/{id}",
            get(api::get_user)
                .put(api::update_user)
                .delete(api::delete_user),
        )
        .route("/users/{id}/password", put(api::set_user_password))
        // Activity log
        .route("/activity", get(api::list_activity))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests;
