//! Create participant table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Participant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participant::Username)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Participant::Email).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Participant::ScreenName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participant::Kind).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Participant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Participant::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Participant::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Participant {
    Table,
    Id,
    Username,
    Email,
    ScreenName,
    Kind,
    CreatedAt,
    UpdatedAt,
}
