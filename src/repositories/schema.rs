//! # Schema Repository
//!
//! This module contains the repository implementation for the per-source
//! validation contract. The ingestion core is read-only here; schema rows are
//! written by the dashboard.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::source_schema::{Column, Entity as SourceSchema, Model};

/// Repository for schema lookups
pub struct SchemaRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SchemaRepository<'a> {
    /// Create a new SchemaRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetch the schema row for a source, if one has been configured.
    ///
    /// Read at request time, never cached: validation must run against the
    /// declared contract as it stands when the payload arrives.
    pub async fn find_by_source_id(
        &self,
        source_id: Uuid,
    ) -> Result<Option<Model>, RepositoryError> {
        let schema = SourceSchema::find()
            .filter(Column::SourceId.eq(source_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(schema)
    }
}
