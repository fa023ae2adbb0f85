pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod models;
pub mod risk;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Settings;
use services::{AgentRegistry, CdpProvider, ChainReader, EventHub};

/// Shared application state. Service seams are trait objects so tests can
/// swap in fixtures.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub provider: Arc<dyn CdpProvider>,
    pub chain: Arc<dyn ChainReader>,
    pub registry: Arc<AgentRegistry>,
    pub events: Arc<EventHub>,
}

pub fn build_router(state: AppState) -> Router {
    let api = handlers::create_agent_routes()
        .route("/health", get(handlers::health_check))
        .nest("/events", handlers::create_event_routes());

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
