//! Migration to create the data_entries table.
//!
//! This migration creates the data_entries table, the relational system of
//! record for accepted ingestion payloads. Rows are queryable by owner and
//! identity value for duplicate detection, and by source for listing.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DataEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DataEntries::Id)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DataEntries::SourceId).uuid().not_null())
                    .col(ColumnDef::new(DataEntries::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(DataEntries::EntryTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DataEntries::Email).text().null())
                    .col(ColumnDef::new(DataEntries::Metadata).json_binary().not_null())
                    .col(ColumnDef::new(DataEntries::FilePath).text().null())
                    .col(ColumnDef::new(DataEntries::FileName).text().null())
                    .col(
                        ColumnDef::new(DataEntries::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_data_entries_source_id")
                            .from(DataEntries::Table, DataEntries::SourceId)
                            .to(Sources::Table, Sources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for the owner-scoped dedupe scan over the trailing window.
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_data_entries_owner_email_ts ON data_entries (owner_id, email, entry_timestamp DESC)".to_string(),
            ))
            .await?;

        // Index for per-source chronological listing.
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "CREATE INDEX IF NOT EXISTS idx_data_entries_source_ts ON data_entries (source_id, entry_timestamp DESC)".to_string(),
            ))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_data_entries_owner_email_ts")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_data_entries_source_ts").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(DataEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DataEntries {
    Table,
    Id,
    SourceId,
    OwnerId,
    EntryTimestamp,
    Email,
    Metadata,
    FilePath,
    FileName,
    ReceivedAt,
}

#[derive(DeriveIden)]
enum Sources {
    Table,
    Id,
}
