use axum::Json;
use blovely_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("blovely-server", env!("CARGO_PKG_VERSION")))
}
