use axum::extract::{Path, State};
use axum::Json;
use diesel::dsl::exists;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use blovely_shared::errors::{AppError, AppResult, ErrorCode};
use blovely_shared::types::auth::AuthUser;
use blovely_shared::types::ApiResponse;

use crate::models::{NewBlock, User, UserBrief};
use crate::schema::{blocks, users};
use crate::AppState;

/// POST /blocks/:user_id - block a user (idempotent)
pub async fn block_user(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    if auth_user.id == target_id {
        return Err(AppError::new(
            ErrorCode::CannotBlockSelf,
            "you cannot block yourself",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let target_exists: bool = diesel::select(exists(
        users::table.filter(users::id.eq(target_id)),
    ))
    .get_result(&mut conn)?;

    if !target_exists {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }

    diesel::insert_into(blocks::table)
        .values(&NewBlock {
            blocker_id: auth_user.id,
            blocked_id: target_id,
        })
        .on_conflict((blocks::blocker_id, blocks::blocked_id))
        .do_nothing()
        .execute(&mut conn)?;

    tracing::info!(blocker = %auth_user.id, blocked = %target_id, "user blocked");

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "blocked": target_id
    }))))
}

/// DELETE /blocks/:user_id - unblock a user (idempotent)
pub async fn unblock_user(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    diesel::delete(
        blocks::table
            .filter(blocks::blocker_id.eq(auth_user.id))
            .filter(blocks::blocked_id.eq(target_id)),
    )
    .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "unblocked": target_id
    }))))
}

/// GET /blocks - the caller's blocked users, as minimal projections
pub async fn list_blocked(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<UserBrief>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let blocked_ids: Vec<Uuid> = blocks::table
        .filter(blocks::blocker_id.eq(auth_user.id))
        .select(blocks::blocked_id)
        .load::<Uuid>(&mut conn)?;

    let blocked: Vec<User> = users::table
        .filter(users::id.eq_any(&blocked_ids))
        .load::<User>(&mut conn)?;

    Ok(Json(ApiResponse::ok(
        blocked.iter().map(UserBrief::from).collect(),
    )))
}
