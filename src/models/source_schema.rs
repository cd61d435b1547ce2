//! Source schema entity model
//!
//! This module contains the SeaORM entity model for the source_schemas table,
//! which stores the per-source validation contract as free-form JSON columns.

use super::source::Entity as Source;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Schema entity holding validation rules for one source's payloads
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "source_schemas")]
pub struct Model {
    /// Unique identifier for the schema row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Source this contract applies to; at most one row per source
    #[sea_orm(unique)]
    pub source_id: Uuid,

    /// JSON array of field names that must be present and non-empty
    #[sea_orm(column_type = "JsonBinary")]
    pub required_fields: JsonValue,

    /// JSON map of field name to expected type tag
    #[sea_orm(column_type = "JsonBinary")]
    pub field_types: JsonValue,

    /// Timestamp when the schema was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the schema was last updated
    pub updated_at: DateTimeWithTimeZone,
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
