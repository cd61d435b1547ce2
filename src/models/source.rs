//! Source entity model
//!
//! This module contains the SeaORM entity model for the sources table,
//! which stores registered ingestion identities, one per API key.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Source entity representing a registered ingestion identity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sources")]
pub struct Model {
    /// Unique identifier for the source (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Dashboard account that owns this source
    pub owner_id: Uuid,

    /// Display name for the source (optional)
    pub name: Option<String>,

    /// Secret API key presented by callers; unique across sources
    #[sea_orm(unique)]
    pub api_key: String,

    /// Whether the source accepts ingestion; inactive sources are
    /// indistinguishable from missing ones at the endpoint
    pub active: bool,

    /// Timestamp of the last accepted submission, if any
    pub last_active_at: Option<DateTimeWithTimeZone>,

    /// Timestamp when the source was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the source was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::data_entry::Entity")]
    DataEntry,
    #[sea_orm(has_one = "super::source_schema::Entity")]
    SourceSchema,
}

impl Related<super::data_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DataEntry.def()
    }
}

impl Related<super::source_schema::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SourceSchema.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
