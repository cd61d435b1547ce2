//! # Data Entry Repository
//!
//! This module contains the repository implementation for DataEntry entities:
//! the authoritative insert performed by the persister and the owner-scoped
//! identity scan used by the duplicate detector.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::data_entry::{ActiveModel, Column, Entity as DataEntry, Model};

/// Column values for one accepted submission.
#[derive(Debug, Clone)]
pub struct NewDataEntry {
    pub id: String,
    pub source_id: Uuid,
    pub owner_id: Uuid,
    pub entry_timestamp: DateTime<Utc>,
    pub email: Option<String>,
    pub metadata: JsonValue,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Repository for DataEntry database operations
pub struct DataEntryRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DataEntryRepository<'a> {
    /// Create a new DataEntryRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert the relational row for an accepted submission.
    pub async fn insert(&self, entry: NewDataEntry) -> Result<Model, RepositoryError> {
        let model = ActiveModel {
            id: Set(entry.id),
            source_id: Set(entry.source_id),
            owner_id: Set(entry.owner_id),
            entry_timestamp: Set(entry.entry_timestamp.into()),
            email: Set(entry.email),
            metadata: Set(entry.metadata),
            file_path: Set(entry.file_path),
            file_name: Set(entry.file_name),
            received_at: Set(entry.received_at.into()),
        };

        let inserted = model
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(inserted)
    }

    /// Find the most recent entry carrying `email` for this owner since
    /// `cutoff`. Owner-scoped on purpose: two sources under the same owner
    /// share the dedupe window.
    pub async fn find_recent_by_identity(
        &self,
        owner_id: Uuid,
        email: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Model>, RepositoryError> {
        let entry = DataEntry::find()
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::Email.eq(email))
            .filter(Column::EntryTimestamp.gte(cutoff))
            .order_by_desc(Column::EntryTimestamp)
            .limit(1)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(entry)
    }
}
