use axum::{
    routing::{delete, get, post},
    Router,
};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use socketioxide::SocketIo;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod matching;
mod models;
mod routes;
mod schema;
mod sessions;
mod socket;

use config::AppConfig;
use sessions::SessionRegistry;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub io: SocketIo,
    pub sessions: SessionRegistry,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    blovely_shared::middleware::init_tracing("blovely-server");

    let config = AppConfig::load()?;
    let port = config.port;

    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    let db = Pool::builder().max_size(10).build(manager)?;

    // Build the Socket.IO layer - we keep io in AppState so REST routes could
    // also emit if they ever need to.
    let (sio_layer, io) = SocketIo::builder().build_layer();

    let state = Arc::new(AppState {
        db,
        config,
        io: io.clone(),
        sessions: SessionRegistry::new(),
    });

    // Configure the Socket.IO namespace with state via closure
    io.ns("/", {
        let state = state.clone();
        move |socket: socketioxide::extract::SocketRef| {
            let state = state.clone();
            async move {
                socket::handlers::on_connect_with_state(socket, state).await;
            }
        }
    });

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Match pipeline
        .route("/like/:target_id", post(routes::likes::like_user))
        .route("/pass/:target_id", post(routes::likes::pass_user))
        .route("/matches", get(routes::likes::list_matches))
        // Message ledger
        .route(
            "/messages/:id",
            get(routes::messages::conversation_history).delete(routes::messages::delete_message),
        )
        .route("/conversations", get(routes::messages::list_conversations))
        .route(
            "/conversations/:user_id",
            delete(routes::messages::delete_conversation),
        )
        // Blocking
        .route(
            "/blocks/:user_id",
            post(routes::blocks::block_user).delete(routes::blocks::unblock_user),
        )
        .route("/blocks", get(routes::blocks::list_blocked))
        // Account
        .route("/account", delete(routes::account::delete_account))
        .layer(sio_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "blovely-server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
