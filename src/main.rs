//! # Intake API Main Entry Point
//!
//! This is the main entry point for the Intake API service.

use intake::{config::ConfigLoader, db::init_pool, server::run_server, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config)?;
    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;

    // Local development applies migrations on boot; production runs them
    // out-of-band. The test profile migrates inside init_pool.
    if config.profile == "local" {
        use migration::MigratorTrait;
        migration::Migrator::up(&db, None).await?;
    }

    run_server(config, db).await
}
