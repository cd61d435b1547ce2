//! # Health Endpoint Handler
//!
//! This module contains the handler for the GET /health endpoint used by
//! deployment probes. It reports 503 when the relational store is unreachable.

use axum::{extract::State, http::StatusCode, response::Json};

use crate::db;
use crate::error::ApiError;
use crate::handlers::types::HealthResponse;
use crate::server::AppState;

/// Liveness/readiness probe backed by a database ping
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    db::health_check(&state.db).await.map_err(|err| {
        tracing::error!(error = ?err, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database service unavailable",
        )
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}
