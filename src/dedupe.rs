//! # Duplicate Detection
//!
//! This module rejects payloads that repeat a semantic identity (the `email`
//! field) within the trailing dedupe window. The check is owner-scoped: two
//! sources under the same owner collide. Payloads without an identity value
//! skip the check entirely.
//!
//! Best-effort by design: concurrent requests racing the same identity may
//! both pass; the relational store remains the authority.

use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::repositories::DataEntryRepository;

/// Payload key whose value identifies a submission for dedupe purposes.
pub const IDENTITY_FIELD: &str = "email";

/// A detected duplicate: the identity value and when it was first accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub email: String,
    pub previous_submission: DateTime<Utc>,
}

/// Extract the identity value from a payload, if it carries one.
pub fn identity_value(payload: &Map<String, Value>) -> Option<&str> {
    match payload.get(IDENTITY_FIELD) {
        Some(Value::String(email)) if !email.is_empty() => Some(email),
        _ => None,
    }
}

/// Check whether `payload` repeats an identity already accepted for `owner_id`
/// within the trailing `window`.
pub async fn find_duplicate(
    db: &DatabaseConnection,
    payload: &Map<String, Value>,
    owner_id: Uuid,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Option<Duplicate>, RepositoryError> {
    let Some(email) = identity_value(payload) else {
        return Ok(None);
    };

    let cutoff = now - window;
    let repo = DataEntryRepository::new(db);
    let prior = repo.find_recent_by_identity(owner_id, email, cutoff).await?;

    Ok(prior.map(|entry| Duplicate {
        email: email.to_string(),
        previous_submission: entry.entry_timestamp.with_timezone(&Utc),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn identity_extracted_from_string_field() {
        let payload = object(json!({"email": "a@x.com", "name": "A"}));
        assert_eq!(identity_value(&payload), Some("a@x.com"));
    }

    #[test]
    fn absent_empty_or_non_string_identity_is_skipped() {
        assert_eq!(identity_value(&object(json!({"name": "A"}))), None);
        assert_eq!(identity_value(&object(json!({"email": ""}))), None);
        assert_eq!(identity_value(&object(json!({"email": 42}))), None);
        assert_eq!(identity_value(&object(json!({"email": null}))), None);
    }
}
