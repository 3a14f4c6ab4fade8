//! Socket.IO event handlers: room joining and real-time message delivery.
//!
//! Every handler is fire-and-forget from the client's point of view. Failures
//! are logged and dropped, never surfaced across the event-loop boundary, so
//! malformed or unauthorized events cannot tear down a persistent connection.
//! In particular, a blocked sender gets no feedback that their message was
//! suppressed.

use std::sync::Arc;

use chrono::Utc;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use socketioxide::extract::{Data, SocketRef};
use uuid::Uuid;

use crate::models::{Message, MessageView, NewMessage, User};
use crate::schema::{blocks, messages, users};
use crate::sessions::identity;
use crate::AppState;

pub async fn on_connect_with_state(socket: SocketRef, state: Arc<AppState>) {
    tracing::debug!(sid = %socket.id, "socket connected");

    socket.on("joinRoom", {
        let state = state.clone();
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| {
            let state = state.clone();
            async move {
                on_join_room(socket, payload, &state).await;
            }
        }
    });

    socket.on("sendMessage", {
        let state = state.clone();
        move |socket: SocketRef, Data::<serde_json::Value>(payload)| {
            let state = state.clone();
            async move {
                on_send_message(socket, payload, &state).await;
            }
        }
    });

    socket.on_disconnect({
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                on_disconnect(socket, state).await;
            }
        }
    });
}

/// `joinRoom { userId }` - bind this connection to a resolved user.
///
/// The raw identifier may be a canonical id, an OAuth id, or an email;
/// resolution failures are a silent no-op so a stale client cannot crash its
/// own connection.
async fn on_join_room(socket: SocketRef, payload: serde_json::Value, state: &Arc<AppState>) {
    let raw = match payload.get("userId").and_then(|v| v.as_str()) {
        Some(raw) if !raw.is_empty() => raw.to_string(),
        _ => {
            tracing::warn!(sid = %socket.id, "joinRoom missing userId");
            return;
        }
    };

    let mut conn = match state.db.get() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "joinRoom: db pool unavailable");
            return;
        }
    };

    let user_id = match identity::resolve_canonical_user(&mut conn, &raw) {
        Ok(Some(id)) => id,
        Ok(None) => {
            tracing::warn!(sid = %socket.id, raw = %raw, "joinRoom: identifier did not resolve");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, raw = %raw, "joinRoom: resolution failed");
            return;
        }
    };

    let came_online = state.sessions.register(socket.id.to_string(), user_id);
    socket.join(format!("user:{user_id}")).ok();

    if came_online {
        set_presence(&mut conn, user_id, true);
    }

    tracing::info!(user_id = %user_id, sid = %socket.id, "user joined room");
}

/// `sendMessage { receiverId, content }` - validate, persist, fan out.
///
/// The whole pipeline fails closed: an unresolved sender, malformed receiver
/// id, missing user, or a block in either direction drops the request with
/// nothing persisted and nothing delivered.
async fn on_send_message(socket: SocketRef, payload: serde_json::Value, state: &Arc<AppState>) {
    let sender_id = match state.sessions.user_for(&socket.id.to_string()) {
        Some(id) => id,
        None => {
            tracing::warn!(sid = %socket.id, "sendMessage from unjoined connection");
            return;
        }
    };

    let receiver_id = match payload
        .get("receiverId")
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        Some(id) => id,
        None => {
            tracing::warn!(sender = %sender_id, "sendMessage with invalid receiverId");
            return;
        }
    };

    let content = match payload.get("content").and_then(|v| v.as_str()) {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        _ => {
            tracing::warn!(sender = %sender_id, "sendMessage with empty content");
            return;
        }
    };

    let mut conn = match state.db.get() {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "sendMessage: db pool unavailable");
            return;
        }
    };

    let (sender, receiver) = match load_pair(&mut conn, sender_id, receiver_id) {
        Ok(Some(pair)) => pair,
        Ok(None) => {
            tracing::warn!(sender = %sender_id, receiver = %receiver_id, "sendMessage: user missing");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "sendMessage: user lookup failed");
            return;
        }
    };

    // Either party's block suppresses delivery, silently: a blocked sender
    // must not learn that they are blocked.
    match pair_is_blocked(&mut conn, sender_id, receiver_id) {
        Ok(false) => {}
        Ok(true) => {
            tracing::debug!(sender = %sender_id, receiver = %receiver_id, "delivery suppressed by block");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "sendMessage: block check failed");
            return;
        }
    }

    let stored: Message = match diesel::insert_into(messages::table)
        .values(&NewMessage {
            sender_id,
            receiver_id,
            content,
        })
        .get_result(&mut conn)
    {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(error = %e, "sendMessage: persist failed");
            return;
        }
    };

    let view = MessageView::expand(&stored, &sender, &receiver);

    // Fan out to every live connection of both participants, the sender's own
    // open sessions included. Best effort past this point; offline connections
    // reconcile through the history endpoint.
    let _ = state
        .io
        .to(format!("user:{receiver_id}"))
        .emit(format!("message_{receiver_id}"), &view);
    let _ = state
        .io
        .to(format!("user:{sender_id}"))
        .emit(format!("message_{sender_id}"), &view);

    tracing::info!(message = %stored.id, sender = %sender_id, receiver = %receiver_id, "message delivered");
}

async fn on_disconnect(socket: SocketRef, state: Arc<AppState>) {
    let Some((user_id, was_last)) = state.sessions.unregister(&socket.id.to_string()) else {
        return;
    };

    tracing::info!(user_id = %user_id, sid = %socket.id, "socket disconnected");

    if was_last {
        if let Ok(mut conn) = state.db.get() {
            set_presence(&mut conn, user_id, false);
        }
    }
}

fn load_pair(
    conn: &mut PgConnection,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> Result<Option<(User, User)>, diesel::result::Error> {
    let sender = users::table
        .find(sender_id)
        .first::<User>(conn)
        .optional()?;
    let receiver = users::table
        .find(receiver_id)
        .first::<User>(conn)
        .optional()?;

    Ok(sender.zip(receiver))
}

fn pair_is_blocked(
    conn: &mut PgConnection,
    a: Uuid,
    b: Uuid,
) -> Result<bool, diesel::result::Error> {
    diesel::select(exists(
        blocks::table.filter(
            blocks::blocker_id
                .eq(a)
                .and(blocks::blocked_id.eq(b))
                .or(blocks::blocker_id.eq(b).and(blocks::blocked_id.eq(a))),
        ),
    ))
    .get_result(conn)
}

fn set_presence(conn: &mut PgConnection, user_id: Uuid, is_online: bool) {
    let result = diesel::update(users::table.find(user_id))
        .set((users::is_online.eq(is_online), users::last_active.eq(Utc::now())))
        .execute(conn);

    if let Err(e) = result {
        tracing::warn!(error = %e, user_id = %user_id, "failed to update presence");
    }
}
