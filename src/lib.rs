pub mod booking_page;
pub mod config;
pub mod controllers;
pub mod middleware;
pub mod models;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn store::BookingStore>,
    pub config: config::Config,
}

impl AppState {
    pub fn new(store: Arc<dyn store::BookingStore>, config: config::Config) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}

/// Главный роутер со всеми маршрутами
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .merge(controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
