use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;

use blovely_shared::errors::{AppError, AppResult};
use blovely_shared::types::auth::AuthUser;
use blovely_shared::types::ApiResponse;

use crate::schema::{blocks, likes, matches, messages, users};
use crate::AppState;

/// DELETE /account - remove the caller and everything referencing them.
///
/// The store enforces no referential integrity across these tables, so the
/// cascade is explicit: messages, likes, matches and blocks go first, then the
/// user row, all in one transaction.
pub async fn delete_account(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let user_id = auth_user.id;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::delete(
            messages::table.filter(
                messages::sender_id
                    .eq(user_id)
                    .or(messages::receiver_id.eq(user_id)),
            ),
        )
        .execute(conn)?;

        diesel::delete(
            likes::table.filter(likes::liker_id.eq(user_id).or(likes::liked_id.eq(user_id))),
        )
        .execute(conn)?;

        diesel::delete(
            matches::table.filter(matches::user_a.eq(user_id).or(matches::user_b.eq(user_id))),
        )
        .execute(conn)?;

        diesel::delete(
            blocks::table.filter(
                blocks::blocker_id
                    .eq(user_id)
                    .or(blocks::blocked_id.eq(user_id)),
            ),
        )
        .execute(conn)?;

        diesel::delete(users::table.find(user_id)).execute(conn)?;

        Ok(())
    })?;

    tracing::info!(user_id = %user_id, "account deleted");

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "deleted": user_id
    }))))
}
