//! # Server Configuration
//!
//! This module contains the router assembly and server lifecycle for the
//! Intake API: shared state, CORS and timeout layers, the request trace
//! context, the rate-limit sweeper, and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
    routing::post,
};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::Any, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::blob::{BlobStore, FsBlobStore};
use crate::config::AppConfig;
use crate::handlers;
use crate::rate_limit::{self, InMemoryRateLimitStore, RateLimitStore};
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub blob_store: Arc<dyn BlobStore>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ]);

    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health::health))
        .route(
            "/data",
            post(handlers::ingest::ingest_data).options(handlers::ingest::preflight),
        )
        .method_not_allowed_fallback(handlers::ingest::method_not_allowed)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Tag each request with a correlation ID, exposed to error envelopes through
/// the task-local trace context and echoed back as `X-Request-Id`.
async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("req-{}", &Uuid::new_v4().to_string()[..8]));

    let context = TraceContext {
        trace_id: trace_id.clone(),
    };
    let mut response = telemetry::with_trace_context(context, next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let rate_limiter: Arc<dyn RateLimitStore> =
        Arc::new(InMemoryRateLimitStore::new(&config.rate_limit));
    let blob_store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.blob_root.clone()));

    let state = AppState {
        config: Arc::clone(&config),
        db,
        rate_limiter: Arc::clone(&rate_limiter),
        blob_store,
    };
    let app = create_app(state);

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(rate_limit::run_sweeper(
        rate_limiter,
        config.rate_limit.sweep_interval_seconds,
        shutdown.clone(),
    ));

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, profile = %config.profile, "Intake API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    let _ = sweeper.await;

    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
    token.cancel();
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health::health,
        crate::handlers::ingest::ingest_data,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::types::IngestAccepted,
            crate::handlers::types::HealthResponse,
            crate::error::ApiError,
        )
    ),
    info(
        title = "Intake API",
        description = "Public data-ingestion endpoint: per-source API keys, dynamic schema validation, duplicate rejection, dual-store persistence",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
