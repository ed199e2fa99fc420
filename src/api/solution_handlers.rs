//! Solution request handler

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use super::{json_body, CurrentUser};
use crate::error::AppResult;
use crate::types::{GetSolutionInput, SolutionResponse};
use crate::AppState;

/// Serve a solution from cache, generating it on a miss
pub async fn get_solution(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    body: Result<Json<GetSolutionInput>, JsonRejection>,
) -> AppResult<Json<SolutionResponse>> {
    let input = json_body(body)?;
    let response = state
        .solution_service
        .get_solution(&user_id, input)
        .await?;
    Ok(Json(response))
}
