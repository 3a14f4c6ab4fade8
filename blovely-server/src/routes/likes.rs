use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use blovely_shared::errors::{AppError, AppResult};
use blovely_shared::types::auth::AuthUser;
use blovely_shared::types::ApiResponse;

use crate::matching::engine;
use crate::models::PublicProfile;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub is_match: bool,
}

#[derive(Debug, Serialize)]
pub struct PassResponse {
    pub success: bool,
}

/// POST /like/:target_id - record interest, report whether a match formed
pub async fn like_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LikeResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let outcome = engine::like(&mut conn, user.id, target_id)?;

    Ok(Json(ApiResponse::ok(LikeResponse {
        is_match: outcome.is_match(),
    })))
}

/// POST /pass/:target_id - withdraw a previously recorded like (idempotent)
pub async fn pass_user(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PassResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    engine::pass(&mut conn, user.id, target_id)?;

    Ok(Json(ApiResponse::ok(PassResponse { success: true })))
}

/// GET /matches - public projections of every match partner, unordered
pub async fn list_matches(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<PublicProfile>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let partners = engine::list_matches(&mut conn, user.id)?;

    Ok(Json(ApiResponse::ok(partners)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_response_wire_shape() {
        let json = serde_json::to_value(LikeResponse { is_match: true }).unwrap();
        assert_eq!(json["isMatch"], true);
        assert!(json.get("is_match").is_none());
    }
}
