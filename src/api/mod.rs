//! HTTP API for LeetNotes
//!
//! Routes are grouped by caller: regular users identified by `X-User-Id`, and
//! admins holding the bearer token.

pub mod admin_handlers;
pub mod auth;
pub mod solution_handlers;
pub mod usage_handlers;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, AppResult};
use crate::services::QuotaError;
use crate::AppState;

pub use auth::{AdminAuth, CurrentUser, USER_ID_HEADER};

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/usage", get(usage_handlers::get_usage))
        .route("/usage/history", get(usage_handlers::get_usage_history))
        .route("/usage/increment", post(usage_handlers::increment_usage))
        .route("/usage/reset", post(usage_handlers::reset_usage))
        .route("/solutions", post(solution_handlers::get_solution))
        .route("/admin/stats", get(admin_handlers::get_stats))
        .route("/admin/cache", delete(admin_handlers::clear_cache))
        .route(
            "/admin/cached-solutions",
            get(admin_handlers::list_cached_solutions),
        )
        .route(
            "/admin/cached-solutions/:id",
            delete(admin_handlers::delete_cached_solution),
        )
        .route("/admin/users/:id/plan", put(admin_handlers::set_user_plan))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run a blocking quota call off the async workers
pub(crate) async fn blocking<T, F>(op: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, QuotaError> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(op).await??)
}

/// Unwrap a JSON body, reporting malformed input as a validation error
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::Validation(e.body_text()))
}
