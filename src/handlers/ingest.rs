//! # Ingestion Endpoint Handler
//!
//! This module contains the handler for POST /data, the public ingestion
//! endpoint. It sequences the gates in order: rate limit, authentication,
//! body parse, duplicate detection, schema validation, normalization,
//! dual-store persistence, and the best-effort stats update. Failure at any
//! gate short-circuits to the matching error envelope; no gate is revisited.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, SecondsFormat, Utc};
use metrics::{counter, histogram};
use serde_json::{Value, json};
use tracing::warn;

use crate::auth;
use crate::dedupe;
use crate::error::{self, ApiError};
use crate::handlers::types::IngestAccepted;
use crate::normalize::normalize;
use crate::repositories::{DataEntryRepository, NewDataEntry, SchemaRepository, SourceRepository};
use crate::server::AppState;
use crate::validation::SchemaRules;

/// Accept one data submission
#[utoipa::path(
    post,
    path = "/data",
    request_body(content = serde_json::Value, description = "Arbitrary JSON object; `id`, `timestamp`, and `email` are recognized but optional"),
    responses(
        (status = 200, description = "Submission accepted", body = IngestAccepted),
        (status = 400, description = "Malformed JSON or schema violation", body = ApiError, example = json!({
            "success": false,
            "message": "Data validation failed",
            "code": "VALIDATION_ERROR",
            "errors": ["Missing required field: sensorId"]
        })),
        (status = 401, description = "API key missing", body = ApiError),
        (status = 403, description = "API key did not resolve to an active source", body = ApiError),
        (status = 409, description = "Identity already submitted within the dedupe window", body = ApiError, example = json!({
            "success": false,
            "message": "A submission with this email was already received recently",
            "code": "DUPLICATE_EMAIL",
            "details": {"email": "a@x.com", "previousSubmission": "2026-03-01T10:30:00.000Z"}
        })),
        (status = 429, description = "Rate limit exceeded", body = ApiError),
        (status = 500, description = "Persistence failure", body = ApiError)
    ),
    tag = "ingest"
)]
pub async fn ingest_data(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestAccepted>, ApiError> {
    let started = Instant::now();
    let result = process(&state, &headers, &body).await;

    let outcome = match &result {
        Ok(_) => "ACCEPTED",
        Err(err) => err.code.as_ref(),
    };
    counter!("intake_requests_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("intake_request_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);

    result
}

async fn process(
    state: &AppState,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<Json<IngestAccepted>, ApiError> {
    let received_at = Utc::now();
    let client_addr = client_address(headers);

    // Checked before authentication so unauthenticated flooding is bounded too.
    let decision = state.rate_limiter.check(&client_addr, received_at).await;
    if !decision.allowed {
        return Err(error::rate_limited(&decision));
    }

    let Some(api_key) = auth::api_key_from_headers(headers) else {
        return Err(error::auth_missing());
    };
    let source = auth::resolve_source(&state.db, &api_key)
        .await
        .map_err(|_| error::auth_failed())?;

    let payload = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        // A parseable non-object cannot carry fields; same rejection as
        // malformed JSON.
        Ok(_) | Err(_) => return Err(error::invalid_json()),
    };

    let window = Duration::hours(state.config.dedupe_window_hours as i64);
    if let Some(duplicate) =
        dedupe::find_duplicate(&state.db, &payload, source.owner_id, window, received_at).await?
    {
        return Err(error::duplicate_email(
            &duplicate.email,
            &duplicate
                .previous_submission
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ));
    }

    // The schema row is read here, per request; a dashboard edit takes effect
    // on the very next submission.
    let schema_row = SchemaRepository::new(&state.db)
        .find_by_source_id(source.id)
        .await?;
    if let Some(row) = &schema_row {
        let failures = SchemaRules::from_model(row).validate(&payload);
        if !failures.is_empty() {
            return Err(error::validation_failed(failures));
        }
    }

    let entry = normalize(&payload, &source, &client_addr, received_at);

    // Blob first, row second. The blob copy is optional: a failed write is
    // logged and the entry proceeds with a null pointer. The row insert is
    // authoritative and fatal on failure, even after a successful blob write.
    let document = serde_json::to_vec(&entry.blob_document()).unwrap_or_default();
    let stored = match state
        .blob_store
        .put(entry.source_id, &entry.file_name(), &document)
        .await
    {
        Ok(stored) => Some(stored),
        Err(err) => {
            warn!(
                error = %err,
                source_id = %entry.source_id,
                entry_id = %entry.id,
                "Blob write failed; continuing with relational insert"
            );
            None
        }
    };

    let inserted = DataEntryRepository::new(&state.db)
        .insert(NewDataEntry {
            id: entry.id.clone(),
            source_id: entry.source_id,
            owner_id: entry.owner_id,
            entry_timestamp: entry.timestamp,
            email: entry.email.clone(),
            metadata: Value::Object(entry.metadata.clone()),
            file_path: stored.as_ref().map(|blob| blob.file_path.clone()),
            file_name: stored.as_ref().map(|blob| blob.file_name.clone()),
            received_at: entry.received_at,
        })
        .await?;

    // Stats are observability, not correctness; never fail the request here.
    if let Err(err) = SourceRepository::new(&state.db)
        .touch_last_active(source.id, received_at)
        .await
    {
        warn!(
            error = %err,
            source_id = %source.id,
            "Failed to update source last-activity stats"
        );
    }

    tracing::info!(
        source_id = %source.id,
        entry_id = %inserted.id,
        has_blob = stored.is_some(),
        "Accepted submission"
    );

    Ok(Json(IngestAccepted::new(entry.response_data())))
}

/// CORS preflight for the ingestion endpoint
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Fallback for unsupported methods on known routes
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({"error": "Method not allowed. Use POST to submit data."})),
    )
        .into_response()
}

/// Identify the caller for rate limiting and provenance: the first
/// `X-Forwarded-For` hop when present (the platform terminates TLS upstream),
/// otherwise a fixed marker.
fn client_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
