//! API route definitions.

use crate::api::{handlers, middleware};
use crate::config::Settings;
use crate::registry::TaskRegistry;
use crate::AppTaskService;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state: the explicit service container.
#[derive(Clone)]
pub struct AppState {
    /// The task coordinator.
    pub service: Arc<AppTaskService>,
    /// The process-wide task registry.
    pub registry: Arc<TaskRegistry>,
    /// Runtime configuration.
    pub settings: Arc<Settings>,
}

/// Build the complete API router.
///
/// Task endpoints sit behind the API-key middleware; `/health` does not.
pub fn create_router(state: AppState) -> Router {
    // Leave generous headroom above the per-file cap for multipart framing.
    let body_limit = state.settings.max_file_size_bytes().saturating_mul(2);

    Router::new()
        .route("/task/run/sync", post(handlers::run_task_sync))
        .route("/task/run/async", post(handlers::run_task_async))
        .route("/task/:id", get(handlers::get_task))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_api_key,
        ))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
