//! Finds the species an iNaturalist observer has recorded least often.

use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use config::Settings;
use routes::{
    api::least_observed,
    health::health_check,
    index::{show_form, submit_form},
};
use services::source::Source;

#[derive(Clone)]
pub struct AppState {
    pub source: Source,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(source: Source, settings: Settings) -> Self {
        Self {
            source,
            settings: Arc::new(settings),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/status", get(health_check))
        .route("/api/least-observed", get(least_observed))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
