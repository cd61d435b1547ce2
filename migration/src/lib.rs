//! Database migrations for the Intake API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_10_000001_create_sources;
mod m2025_06_10_000002_create_source_schemas;
mod m2025_06_10_000003_create_data_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_10_000001_create_sources::Migration),
            Box::new(m2025_06_10_000002_create_source_schemas::Migration),
            Box::new(m2025_06_10_000003_create_data_entries::Migration),
        ]
    }
}
