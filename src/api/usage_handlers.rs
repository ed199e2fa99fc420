//! Usage quota handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::{blocking, json_body, CurrentUser};
use crate::error::{AppError, AppResult};
use crate::types::{
    IncrementUsageInput, ResetUsageInput, ResetUsageResponse, UsageHistoryResponse, UsageSnapshot,
};
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 30;
const MAX_HISTORY_LIMIT: usize = 365;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Get the caller's usage for today
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<UsageSnapshot>> {
    let quota = state.quota_service.clone();
    let snapshot = blocking(move || quota.get_usage(&user_id)).await?;
    Ok(Json(snapshot))
}

/// Get the caller's most recent daily records
pub async fn get_usage_history(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<UsageHistoryResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let quota = state.quota_service.clone();
    let history = blocking(move || quota.usage_history(&user_id, limit)).await?;
    Ok(Json(UsageHistoryResponse { history }))
}

/// Count one action against the caller's daily quota
pub async fn increment_usage(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<IncrementUsageInput>, JsonRejection>,
) -> AppResult<Json<UsageSnapshot>> {
    let input = json_body(body)?;

    let quota = state.quota_service.clone();
    let snapshot = blocking(move || quota.increment_usage(&user_id, input.action)).await?;
    Ok(Json(snapshot))
}

/// Delete the caller's usage records; only enabled for debugging
pub async fn reset_usage(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<ResetUsageInput>, JsonRejection>,
) -> AppResult<Json<ResetUsageResponse>> {
    if !state.config.allow_usage_reset {
        return Err(AppError::Forbidden("Usage reset is disabled".into()));
    }

    let input = json_body(body)?;
    let scope = input.action;

    let quota = state.quota_service.clone();
    let deleted_records = blocking(move || quota.reset_usage(&user_id, scope)).await?;
    Ok(Json(ResetUsageResponse {
        action: scope,
        deleted_records,
    }))
}
