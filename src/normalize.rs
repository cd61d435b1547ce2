//! # Payload Normalization
//!
//! This module turns a validated payload into the durable entry shape:
//! assigns an identifier when the payload lacks one, canonicalizes the
//! timestamp, and attaches provenance (source, owner, client address,
//! arrival time). Provenance stays on the struct and in the blob document;
//! it never appears in the persisted metadata view. Normalization cannot
//! fail.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::dedupe::{IDENTITY_FIELD, identity_value};
use crate::models::source;

/// Payload keys lifted out of the metadata map during normalization.
const RESERVED_FIELDS: [&str; 3] = ["id", "timestamp", IDENTITY_FIELD];

/// The normalized, persistable form of one accepted submission.
#[derive(Debug, Clone)]
pub struct NormalizedEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_id: Uuid,
    pub owner_id: Uuid,
    pub client_addr: String,
    pub received_at: DateTime<Utc>,
    pub email: Option<String>,
    pub metadata: Map<String, Value>,
}

/// Normalize a payload for the given source.
///
/// The entry id is the payload's `id` when that is a non-empty string,
/// otherwise a fresh UUID. The timestamp is the payload's `timestamp`
/// re-parsed as RFC 3339 and converted to UTC; anything unparseable falls
/// back to the arrival time.
pub fn normalize(
    payload: &Map<String, Value>,
    source: &source::Model,
    client_addr: &str,
    received_at: DateTime<Utc>,
) -> NormalizedEntry {
    let id = match payload.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => Uuid::new_v4().to_string(),
    };

    let timestamp = payload
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or(received_at);

    let email = identity_value(payload).map(str::to_string);

    let metadata: Map<String, Value> = payload
        .iter()
        .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    NormalizedEntry {
        id,
        timestamp,
        source_id: source.id,
        owner_id: source.owner_id,
        client_addr: client_addr.to_string(),
        received_at,
        email,
        metadata,
    }
}

impl NormalizedEntry {
    /// Canonical RFC 3339 rendering of the entry timestamp.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Blob file name: a compact UTC timestamp prefix keeps per-source
    /// listings chronological; the id suffix rules out collisions.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.json",
            self.timestamp.format("%Y%m%dT%H%M%S%3fZ"),
            sanitize_for_file_name(&self.id)
        )
    }

    /// The full archival document written to blob storage, provenance included.
    pub fn blob_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("id".to_string(), json!(self.id));
        doc.insert("timestamp".to_string(), json!(self.timestamp_rfc3339()));
        doc.insert("sourceId".to_string(), json!(self.source_id));
        doc.insert("ownerId".to_string(), json!(self.owner_id));
        doc.insert("clientAddress".to_string(), json!(self.client_addr));
        doc.insert(
            "receivedAt".to_string(),
            json!(self.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        if let Some(email) = &self.email {
            doc.insert(IDENTITY_FIELD.to_string(), json!(email));
        }
        for (key, value) in &self.metadata {
            doc.insert(key.clone(), value.clone());
        }
        Value::Object(doc)
    }

    /// The `data` object of the success envelope: canonical identity plus the
    /// caller's original fields, without provenance.
    pub fn response_data(&self) -> Value {
        let mut data = Map::new();
        data.insert("id".to_string(), json!(self.id));
        data.insert("timestamp".to_string(), json!(self.timestamp_rfc3339()));
        data.insert("sourceId".to_string(), json!(self.source_id));
        if let Some(email) = &self.email {
            data.insert(IDENTITY_FIELD.to_string(), json!(email));
        }
        for (key, value) in &self.metadata {
            data.insert(key.clone(), value.clone());
        }
        Value::Object(data)
    }
}

/// Keep blob file names shell- and filesystem-safe regardless of what the
/// caller put in `id`.
fn sanitize_for_file_name(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
