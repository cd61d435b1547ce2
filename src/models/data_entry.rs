//! Data entry entity model
//!
//! This module contains the SeaORM entity model for the data_entries table,
//! the relational system of record for accepted ingestion payloads.

use super::source::Entity as Source;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Data entry representing one accepted submission
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "data_entries")]
pub struct Model {
    /// Entry identifier: caller-supplied or generated at normalization
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Source the entry arrived through
    pub source_id: Uuid,

    /// Owner of the source at submission time
    pub owner_id: Uuid,

    /// Canonical entry timestamp (payload-supplied or arrival time)
    pub entry_timestamp: DateTimeWithTimeZone,

    /// Identity value used for duplicate detection, when the payload carried one
    pub email: Option<String>,

    /// Payload fields minus identity and provenance keys
    #[sea_orm(column_type = "JsonBinary")]
    pub metadata: JsonValue,

    /// Directory of the archival blob copy; null when the blob write failed
    pub file_path: Option<String>,

    /// File name of the archival blob copy; null when the blob write failed
    pub file_name: Option<String>,

    /// Timestamp when the request was received
    pub received_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Source",
        from = "Column::SourceId",
        to = "super::source::Column::Id"
    )]
    Source,
}

impl Related<Source> for Entity {
    fn to() -> RelationDef {
        Relation::Source.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
