//! Migration to create the sources table.
//!
//! This migration creates the sources table, which stores registered ingestion
//! identities: one row per API key, owned by a dashboard account.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sources::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sources::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sources::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Sources::Name).text().null())
                    .col(ColumnDef::new(Sources::ApiKey).text().not_null())
                    .col(
                        ColumnDef::new(Sources::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Sources::LastActiveAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Sources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Sources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One non-deleted source per key; the authenticator relies on this.
        manager
            .create_index(
                Index::create()
                    .name("idx_sources_api_key")
                    .table(Sources::Table)
                    .col(Sources::ApiKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sources_owner")
                    .table(Sources::Table)
                    .col(Sources::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sources_api_key").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_sources_owner").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Sources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sources {
    Table,
    Id,
    OwnerId,
    Name,
    ApiKey,
    Active,
    LastActiveAt,
    CreatedAt,
    UpdatedAt,
}
