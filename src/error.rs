//! # Error Handling
//!
//! This module provides unified error handling for the Intake API,
//! implementing the structured `{success: false, code, ...}` response
//! envelope with trace ID propagation.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::rate_limit::RateDecision;
use crate::telemetry;

/// Unified API error response envelope.
///
/// Every failure leaving the service serializes to
/// `{success: false, message, code, errors?, details?}` with a stable `code`
/// suitable for programmatic handling. Rate-limit bookkeeping travels as
/// response headers, never in the body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing)]
    pub status: StatusCode,
    /// Always false; mirrors the success envelope shape
    pub success: bool,
    /// Human-readable error message
    pub message: Box<str>,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Itemized validation failures (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Suggested retry delay, emitted as the Retry-After header
    #[serde(skip_serializing)]
    pub retry_after: Option<u64>,
    /// Rate-limit counters, emitted as X-RateLimit-* headers
    #[serde(skip_serializing)]
    pub rate_limit: Option<RateLimitHeaders>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

/// Values for the X-RateLimit-* response headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitHeaders {
    pub limit: u32,
    pub remaining: u32,
    /// Unix seconds at which the oldest counted request leaves the window
    pub reset: i64,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<S: Into<String>>(status: StatusCode, code: S, message: S) -> Self {
        Self {
            status,
            success: false,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            errors: None,
            details: None,
            retry_after: None,
            rate_limit: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Attach itemized validation errors
    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Set retry after delay
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    /// Extract current trace ID from the active request context (falls back to
    /// a generated correlation ID for basic client-server log correlation)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

/// Errors surfaced by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
}

impl RepositoryError {
    /// Wrap a SeaORM error
    pub fn database_error(err: sea_orm::DbErr) -> Self {
        Self::Database(err)
    }

    /// Create a validation error
    pub fn validation_error<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();

        if let Some(retry_after) = self.retry_after
            && let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string())
        {
            headers.insert("retry-after", header_value);
        }

        if let Some(rate) = self.rate_limit {
            if let Ok(value) = HeaderValue::from_str(&rate.limit.to_string()) {
                headers.insert("x-ratelimit-limit", value);
            }
            if let Ok(value) = HeaderValue::from_str(&rate.remaining.to_string()) {
                headers.insert("x-ratelimit-remaining", value);
            }
            if let Ok(value) = HeaderValue::from_str(&rate.reset.to_string()) {
                headers.insert("x-ratelimit-reset", value);
            }
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", error);
        server_error()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        tracing::error!("Repository error: {:?}", error);
        server_error()
    }
}

/// Create an auth failure for a request that carried no key at all (401)
pub fn auth_missing() -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "AUTH_FAILED", "API key is required")
}

/// Create an auth failure for a key that did not resolve (403).
///
/// The same code and message cover unknown keys, inactive sources, and lookup
/// failures so callers cannot probe which branch occurred.
pub fn auth_failed() -> ApiError {
    ApiError::new(StatusCode::FORBIDDEN, "AUTH_FAILED", "Invalid API key")
}

/// Create a validation error for a body that did not parse as a JSON object
pub fn invalid_json() -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        "Invalid JSON format",
    )
}

/// Create a validation error with the itemized rule failures
pub fn validation_failed(errors: Vec<String>) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR",
        "Data validation failed",
    )
    .with_errors(errors)
}

/// Create a duplicate-identity rejection carrying the prior submission time
pub fn duplicate_email(email: &str, previous_submission: &str) -> ApiError {
    ApiError::new(
        StatusCode::CONFLICT,
        "DUPLICATE_EMAIL",
        "A submission with this email was already received recently",
    )
    .with_details(json!({
        "email": email,
        "previousSubmission": previous_submission,
    }))
}

/// Create a rate-limit rejection from the limiter's decision
pub fn rate_limited(decision: &RateDecision) -> ApiError {
    let mut error = ApiError::new(
        StatusCode::TOO_MANY_REQUESTS,
        "RATE_LIMIT_EXCEEDED",
        "Too many requests. Please try again later",
    );
    error.retry_after = decision.retry_after_seconds;
    error.rate_limit = Some(RateLimitHeaders {
        limit: decision.limit,
        remaining: decision.remaining,
        reset: decision.reset_at.timestamp(),
    });
    error
}

/// Create an opaque internal error (500)
pub fn server_error() -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "SERVER_ERROR",
        "An internal server error occurred",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Test message");

        assert_eq!(error.code, Box::from("VALIDATION_ERROR"));
        assert_eq!(error.message, Box::from("Test message"));
        assert!(!error.success);
        assert!(error.errors.is_none());
        assert!(error.details.is_none());
        assert!(error.retry_after.is_none());
    }

    #[test]
    fn test_envelope_shape() {
        let error = validation_failed(vec!["Missing required field: sensorId".to_string()]);
        let body = serde_json::to_value(&error).unwrap();

        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));
        assert_eq!(body["message"], json!("Data validation failed"));
        assert_eq!(
            body["errors"],
            json!(["Missing required field: sensorId"])
        );
        // Header-only bookkeeping must not leak into the body.
        assert!(body.get("retry_after").is_none());
        assert!(body.get("rate_limit").is_none());
        assert!(body.get("status").is_none());
    }

    #[test]
    fn test_auth_errors_share_code() {
        let missing = auth_missing();
        let failed = auth_failed();

        assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
        assert_eq!(failed.status, StatusCode::FORBIDDEN);
        assert_eq!(missing.code, failed.code);
    }

    #[test]
    fn test_duplicate_email_details() {
        let error = duplicate_email("a@x.com", "2026-01-01T00:00:00+00:00");

        assert_eq!(error.status, StatusCode::CONFLICT);
        assert_eq!(error.code, Box::from("DUPLICATE_EMAIL"));
        let details = error.details.unwrap();
        assert_eq!(details["email"], json!("a@x.com"));
        assert_eq!(
            details["previousSubmission"],
            json!("2026-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_rate_limited_headers() {
        let decision = RateDecision {
            allowed: false,
            limit: 60,
            remaining: 0,
            retry_after_seconds: Some(42),
            reset_at: Utc::now(),
        };
        let error = rate_limited(&decision);
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("retry-after").unwrap(), "42");
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "60");
        assert_eq!(
            response.headers().get("x-ratelimit-remaining").unwrap(),
            "0"
        );
        assert!(response.headers().contains_key("x-ratelimit-reset"));
    }

    #[test]
    fn test_status_code_preservation() {
        let error = server_error();
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_trace_id_generation() {
        let error = server_error();

        assert!(error.trace_id.is_some());
        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
    }

    #[test]
    fn test_repository_error_maps_to_server_error() {
        let repo_err = RepositoryError::NotFound("entry".to_string());
        let api_error: ApiError = repo_err.into();

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, Box::from("SERVER_ERROR"));
        assert_eq!(
            api_error.message,
            Box::from("An internal server error occurred")
        );
    }
}
