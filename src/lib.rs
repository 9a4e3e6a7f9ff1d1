pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod security;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cache::ChallengeStore;
use store::Store;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: config::Config,
    pub store: Arc<dyn Store>,
    pub challenges: Arc<dyn ChallengeStore>,
}

impl AppState {
    pub fn new(
        config: config::Config,
        store: Arc<dyn Store>,
        challenges: Arc<dyn ChallengeStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            challenges,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Movie Reservation API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
