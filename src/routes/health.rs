use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        common::ApiResponse,
        health::{HealthResponse, PingResponse},
    },
    services::health_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service health including store connectivity", body = HealthResponse))
)]
/// Return the current health status of the backend, pinging the store.
pub async fn health(State(state): State<SharedState>) -> Json<ApiResponse<HealthResponse>> {
    let status = health_service::health_status(&state).await;
    Json(ApiResponse::ok(status))
}

#[utoipa::path(
    get,
    path = "/ping",
    tag = "health",
    responses((status = 200, description = "Liveness probe", body = PingResponse))
)]
/// Plain liveness probe that never touches storage.
pub async fn ping() -> Json<ApiResponse<PingResponse>> {
    Json(ApiResponse::ok(PingResponse::pong()))
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
}
