use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::now_timestamp;

/// Health payload returned by the `/health` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Response timestamp (RFC 3339).
    pub timestamp: String,
}

impl HealthResponse {
    /// Health response indicating the system is operational.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: now_timestamp(),
        }
    }

    /// Health response indicating the system runs without storage.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            timestamp: now_timestamp(),
        }
    }
}

/// Liveness payload returned by the `/ping` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    /// Always "pong".
    pub message: String,
    /// Response timestamp (RFC 3339).
    pub timestamp: String,
}

impl PingResponse {
    /// Fresh pong payload.
    pub fn pong() -> Self {
        Self {
            message: "pong".to_string(),
            timestamp: now_timestamp(),
        }
    }
}
