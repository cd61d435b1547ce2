//! # Handler Response Types
//!
//! Shared response payload types for the ingestion endpoint.

use serde::Serialize;
use utoipa::ToSchema;

/// Success envelope returned for an accepted submission
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestAccepted {
    /// Always true
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
    /// Canonical identity plus the caller's original fields
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

impl IngestAccepted {
    /// Build the envelope around the normalized entry's response view.
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: "Data received successfully".to_string(),
            data,
        }
    }
}

/// Health probe response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status
    #[schema(example = "ok")]
    pub status: String,
}
