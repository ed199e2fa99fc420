//! Cache admin handlers, gated by [`AdminAuth`]

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{blocking, json_body, AdminAuth};
use crate::error::AppResult;
use crate::services::QuotaError;
use crate::types::{
    AdminStatsResponse, CachedSolutionListResponse, DeleteCacheResponse, SetPlanInput, User,
};
use crate::AppState;

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Cache tier statistics plus user and usage counters
pub async fn get_stats(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<AdminStatsResponse>> {
    let cache = state.solution_cache.stats().await;

    let quota = state.quota_service.clone();
    let (users, usage_today) = blocking(move || -> Result<_, QuotaError> {
        Ok((quota.user_stats()?, quota.today_totals()?))
    })
    .await?;

    Ok(Json(AdminStatsResponse {
        cache,
        users,
        usage_today,
    }))
}

/// Empty every cache tier
pub async fn clear_cache(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Json<DeleteCacheResponse> {
    let report = state.solution_cache.clear_all().await;
    Json(DeleteCacheResponse {
        success: true,
        cleared: Some(report),
    })
}

/// Browse durable cache entries, newest first
pub async fn list_cached_solutions(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<CachedSolutionListResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let solutions = state.solution_cache.list(limit, offset).await;
    let total = state.solution_cache.stats().await.durable.count;

    Json(CachedSolutionListResponse { solutions, total })
}

/// Evict one entry from every tier
pub async fn delete_cached_solution(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<DeleteCacheResponse>) {
    let success = state.solution_cache.remove_by_id(&id).await;
    let status = if success {
        tracing::info!("Deleted cached solution {}", id);
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    (
        status,
        Json(DeleteCacheResponse {
            success,
            cleared: None,
        }),
    )
}

/// Change a user's plan, creating the user if needed
pub async fn set_user_plan(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    body: Result<Json<SetPlanInput>, JsonRejection>,
) -> AppResult<Json<User>> {
    let input = json_body(body)?;

    let quota = state.quota_service.clone();
    let user = blocking(move || quota.set_plan(&user_id, input.plan)).await?;
    Ok(Json(user))
}
