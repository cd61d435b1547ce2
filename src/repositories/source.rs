//! # Source Repository
//!
//! This module contains the repository implementation for Source entities:
//! the API-key lookup used by the authenticator and the best-effort
//! last-activity bookkeeping.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::source::{Column, Entity as Source, Model};

/// Repository for Source database operations
pub struct SourceRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SourceRepository<'a> {
    /// Create a new SourceRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Find the source registered under `api_key`, if it exists and is active.
    ///
    /// Inactive sources are filtered out here so they are indistinguishable
    /// from unregistered keys at the call site.
    pub async fn find_active_by_api_key(
        &self,
        api_key: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        let source = Source::find()
            .filter(Column::ApiKey.eq(api_key))
            .filter(Column::Active.eq(true))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(source)
    }

    /// Record ingestion activity on a source by bumping `last_active_at`.
    pub async fn touch_last_active(
        &self,
        source_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let source = Source::find_by_id(source_id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::NotFound("Source not found".to_string()))?;

        let mut active = source.into_active_model();
        active.last_active_at = Set(Some(at.into()));
        active.updated_at = Set(at.into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }
}
