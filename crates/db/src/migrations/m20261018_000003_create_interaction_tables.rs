//! Create poll, choice and question tables migration.

use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_participant_table::Participant;
use super::m20261018_000002_create_config_tables::{PollConfig, QuestionConfig};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Config FKs restrict: an owned config is removed only after its interaction
        manager
            .create_table(
                Table::create()
                    .table(Poll::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Poll::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Poll::EventId).string_len(64).not_null())
                    .col(ColumnDef::new(Poll::CreatorId).string_len(32).not_null())
                    .col(ColumnDef::new(Poll::Question).string_len(256).not_null())
                    .col(ColumnDef::new(Poll::ConfigId).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Poll::Published).boolean().not_null().default(false))
                    .col(ColumnDef::new(Poll::Streaming).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Poll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Poll::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_creator")
                            .from(Poll::Table, Poll::CreatorId)
                            .to(Participant::Table, Participant::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_config")
                            .from(Poll::Table, Poll::ConfigId)
                            .to(PollConfig::Table, PollConfig::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_poll_event_id")
                    .table(Poll::Table)
                    .col(Poll::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Choice::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Choice::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Choice::PollId).string_len(32).not_null())
                    .col(ColumnDef::new(Choice::Text).string_len(256).not_null())
                    .col(ColumnDef::new(Choice::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_choice_poll")
                            .from(Choice::Table, Choice::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (poll_id, position) - ordering within a poll
        manager
            .create_index(
                Index::create()
                    .name("idx_choice_poll_position")
                    .table(Choice::Table)
                    .col(Choice::PollId)
                    .col(Choice::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Question::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Question::EventId).string_len(64).not_null())
                    .col(ColumnDef::new(Question::CreatorId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Question).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Question::ConfigId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Question::Published).boolean().not_null().default(false))
                    .col(ColumnDef::new(Question::Streaming).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Question::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Question::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_creator")
                            .from(Question::Table, Question::CreatorId)
                            .to(Participant::Table, Participant::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_config")
                            .from(Question::Table, Question::ConfigId)
                            .to(QuestionConfig::Table, QuestionConfig::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_question_event_id")
                    .table(Question::Table)
                    .col(Question::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Choice::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Poll::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Poll {
    Table,
    Id,
    EventId,
    CreatorId,
    Question,
    ConfigId,
    Published,
    Streaming,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Choice {
    Table,
    Id,
    PollId,
    Text,
    Position,
}

#[derive(DeriveIden)]
pub enum Question {
    Table,
    Id,
    EventId,
    CreatorId,
    Question,
    ConfigId,
    Published,
    Streaming,
    CreatedAt,
    UpdatedAt,
}
