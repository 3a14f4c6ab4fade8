use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use blovely_shared::errors::{AppError, AppResult, ErrorCode};
use blovely_shared::types::auth::AuthUser;
use blovely_shared::types::ApiResponse;

use crate::models::{Message, MessageView, User, UserBrief};
use crate::schema::{messages, users};
use crate::AppState;

/// GET /messages/:user_id - full history with one partner, oldest first.
///
/// This is the reconnect path: clients that were offline pull history here to
/// reconcile messages the socket never delivered to them.
pub async fn conversation_history(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<MessageView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me: User = users::table
        .find(auth_user.id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let partner: User = users::table
        .find(partner_id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let history: Vec<Message> = messages::table
        .filter(
            messages::sender_id
                .eq(me.id)
                .and(messages::receiver_id.eq(partner.id))
                .or(messages::sender_id
                    .eq(partner.id)
                    .and(messages::receiver_id.eq(me.id))),
        )
        .order(messages::created_at.asc())
        .load::<Message>(&mut conn)?;

    let views = history
        .iter()
        .map(|m| {
            if m.sender_id == me.id {
                MessageView::expand(m, &me, &partner)
            } else {
                MessageView::expand(m, &partner, &me)
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub user: UserBrief,
    pub last_message: MessageView,
}

/// GET /conversations - one entry per chat partner, carrying the latest
/// message, newest conversation first.
pub async fn list_conversations(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ConversationView>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let me: User = users::table
        .find(auth_user.id)
        .first::<User>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let involving_me: Vec<Message> = messages::table
        .filter(
            messages::sender_id
                .eq(me.id)
                .or(messages::receiver_id.eq(me.id)),
        )
        .order(messages::created_at.desc())
        .load::<Message>(&mut conn)?;

    // Newest-first scan: the first message seen per partner is the latest one.
    let mut latest_per_partner: Vec<(Uuid, Message)> = Vec::new();
    for message in involving_me {
        let partner_id = if message.sender_id == me.id {
            message.receiver_id
        } else {
            message.sender_id
        };
        if !latest_per_partner.iter().any(|(pid, _)| *pid == partner_id) {
            latest_per_partner.push((partner_id, message));
        }
    }

    let partner_ids: Vec<Uuid> = latest_per_partner.iter().map(|(pid, _)| *pid).collect();
    let partners: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&partner_ids))
        .load::<User>(&mut conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut conversations = Vec::new();
    for (partner_id, message) in latest_per_partner {
        // Partner may have deleted their account; skip the orphaned thread.
        let Some(partner) = partners.get(&partner_id) else {
            continue;
        };
        let view = if message.sender_id == me.id {
            MessageView::expand(&message, &me, partner)
        } else {
            MessageView::expand(&message, partner, &me)
        };
        conversations.push(ConversationView {
            user: UserBrief::from(partner),
            last_message: view,
        });
    }

    Ok(Json(ApiResponse::ok(conversations)))
}

/// DELETE /messages/:message_id - only the sender may delete a message
pub async fn delete_message(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let message: Message = messages::table
        .find(message_id)
        .first::<Message>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    if message.sender_id != auth_user.id {
        return Err(AppError::new(
            ErrorCode::NotMessageSender,
            "you can only delete your own messages",
        ));
    }

    diesel::delete(messages::table.find(message_id)).execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "deleted": message_id
    }))))
}

/// DELETE /conversations/:user_id - delete the whole pair history, both
/// directions
pub async fn delete_conversation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(
        messages::table.filter(
            messages::sender_id
                .eq(auth_user.id)
                .and(messages::receiver_id.eq(partner_id))
                .or(messages::sender_id
                    .eq(partner_id)
                    .and(messages::receiver_id.eq(auth_user.id))),
        ),
    )
    .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "deleted": deleted
    }))))
}
