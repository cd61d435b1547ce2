//! # Source Authentication
//!
//! This module resolves the API key presented by an ingestion caller to a
//! registered, active source. Every failure branch (unknown key, inactive
//! source, lookup error) collapses into the single sealed [`AuthError`]
//! variant, so call sites cannot leak which branch occurred and callers
//! cannot enumerate keys.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use sea_orm::DatabaseConnection;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::models::source;
use crate::repositories::SourceRepository;

/// Opaque authentication failure. The private unit field keeps construction
/// inside this module; there is deliberately no variant describing why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthError(());

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("authentication failed")
    }
}

impl std::error::Error for AuthError {}

/// Extract the API key from request headers.
///
/// `X-API-Key` wins; the legacy `Authorization: Bearer <key>` form is accepted
/// as a fallback with the prefix stripped case-insensitively. No format
/// validation beyond presence.
pub fn api_key_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-api-key")
        && let Ok(key) = value.to_str()
        && !key.is_empty()
    {
        return Some(key.to_string());
    }

    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (prefix, key) = value.split_at_checked(7)?;
    if prefix.eq_ignore_ascii_case("bearer ") && !key.is_empty() {
        Some(key.to_string())
    } else {
        None
    }
}

/// Resolve an API key to its active source.
///
/// Exactly one lookup against the source directory; the fetched key is
/// re-compared in constant time before the source is handed back.
pub async fn resolve_source(
    db: &DatabaseConnection,
    api_key: &str,
) -> Result<source::Model, AuthError> {
    let repo = SourceRepository::new(db);

    let found = match repo.find_active_by_api_key(api_key).await {
        Ok(found) => found,
        Err(err) => {
            warn!(error = %err, "Source lookup failed during authentication");
            return Err(AuthError(()));
        }
    };

    match found {
        Some(src)
            if bool::from(ConstantTimeEq::ct_eq(
                src.api_key.as_bytes(),
                api_key.as_bytes(),
            )) =>
        {
            Ok(src)
        }
        _ => Err(AuthError(())),
    }
}
