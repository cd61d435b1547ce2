//! Migration to create the source_schemas table.
//!
//! This migration creates the source_schemas table, which stores the per-source
//! validation contract: required field names and expected field types.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SourceSchemas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SourceSchemas::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SourceSchemas::SourceId).uuid().not_null())
                    .col(
                        ColumnDef::new(SourceSchemas::RequiredFields)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SourceSchemas::FieldTypes)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SourceSchemas::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SourceSchemas::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_source_schemas_source_id")
                            .from(SourceSchemas::Table, SourceSchemas::SourceId)
                            .to(Sources::Table, Sources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one schema row per source; the validator reads it by source id.
        manager
            .create_index(
                Index::create()
                    .name("idx_source_schemas_source")
                    .table(SourceSchemas::Table)
                    .col(SourceSchemas::SourceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_source_schemas_source").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SourceSchemas::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SourceSchemas {
    Table,
    Id,
    SourceId,
    RequiredFields,
    FieldTypes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Sources {
    Table,
    Id,
}
