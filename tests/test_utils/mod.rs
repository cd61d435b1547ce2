//! Test utilities for the ingestion endpoint suite.
//!
//! This module provides helpers for setting up in-memory SQLite databases
//! with migrations applied, seeding sources and schemas, and assembling the
//! application router against temporary blob storage.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode};
use chrono::Utc;
use intake::blob::{BlobError, BlobStore, FsBlobStore, StoredBlob};
use intake::config::AppConfig;
use intake::models::{source, source_schema};
use intake::rate_limit::InMemoryRateLimitStore;
use intake::server::{AppState, create_app};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::Value;
use tempfile::TempDir;
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Inserts a source row and returns the model.
pub async fn insert_source(
    db: &DatabaseConnection,
    owner_id: Uuid,
    api_key: &str,
    active: bool,
) -> Result<source::Model> {
    let now = Utc::now();
    let model = source::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        name: Set(Some("test source".to_string())),
        api_key: Set(api_key.to_string()),
        active: Set(active),
        last_active_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(model.insert(db).await?)
}

/// Inserts a schema row for a source.
pub async fn insert_schema(
    db: &DatabaseConnection,
    source_id: Uuid,
    required_fields: Value,
    field_types: Value,
) -> Result<source_schema::Model> {
    let now = Utc::now();
    let model = source_schema::ActiveModel {
        id: Set(Uuid::new_v4()),
        source_id: Set(source_id),
        required_fields: Set(required_fields),
        field_types: Set(field_types),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(model.insert(db).await?)
}

/// A harness around one application instance with its own database and blob
/// root. The temp directory is held so blobs stay inspectable for the test's
/// lifetime.
pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub blob_root: TempDir,
}

/// Build an app with filesystem blob storage and the given rate limit cap.
pub async fn spawn_app(max_requests: u32) -> Result<TestApp> {
    let db = setup_test_db().await?;
    let blob_root = TempDir::new()?;
    let blob_store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(blob_root.path()));
    let app = build_router(db.clone(), blob_store, max_requests);

    Ok(TestApp {
        app,
        db,
        blob_root,
    })
}

/// Build an app whose blob store always fails, for partial-failure tests.
pub async fn spawn_app_with_failing_blobs(max_requests: u32) -> Result<TestApp> {
    let db = setup_test_db().await?;
    let blob_root = TempDir::new()?;
    let blob_store: Arc<dyn BlobStore> = Arc::new(FailingBlobStore);
    let app = build_router(db.clone(), blob_store, max_requests);

    Ok(TestApp {
        app,
        db,
        blob_root,
    })
}

fn build_router(
    db: DatabaseConnection,
    blob_store: Arc<dyn BlobStore>,
    max_requests: u32,
) -> Router {
    let mut config = AppConfig {
        profile: "test".to_string(),
        ..Default::default()
    };
    config.rate_limit.max_requests = max_requests;
    let config = Arc::new(config);

    let rate_limiter = Arc::new(InMemoryRateLimitStore::new(&config.rate_limit));

    create_app(AppState {
        config,
        db,
        rate_limiter,
        blob_store,
    })
}

/// Blob store that refuses every write.
pub struct FailingBlobStore;

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(
        &self,
        _source_id: Uuid,
        file_name: &str,
        _contents: &[u8],
    ) -> Result<StoredBlob, BlobError> {
        Err(BlobError::Io {
            file_name: file_name.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "blob store offline"),
        })
    }
}

/// Build a POST /data request with the given key, caller address, and body.
pub fn ingest_request(api_key: Option<&str>, client_addr: &str, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/data")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client_addr);

    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

/// Read a response into its status and parsed JSON body.
pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
