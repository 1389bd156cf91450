//! Create poll_config, question_config and event_config tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PollConfig::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PollConfig::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(PollConfig::AnswersPrivacy).string_len(32).not_null())
                    .col(ColumnDef::new(PollConfig::PresentToAudience).boolean().not_null())
                    .col(ColumnDef::new(PollConfig::Enabled).boolean().not_null())
                    .col(ColumnDef::new(PollConfig::MultipleAnswers).boolean().not_null())
                    .col(
                        ColumnDef::new(PollConfig::AllowNoLimitedAnswering)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PollConfig::AnsweringTimeLimit)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(PollConfig::AnsweringTimeLimit).between(0, 75)),
                    )
                    .col(
                        ColumnDef::new(PollConfig::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuestionConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionConfig::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QuestionConfig::AnswersPrivacy)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionConfig::PresentToAudience)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuestionConfig::Enabled).boolean().not_null())
                    .col(
                        ColumnDef::new(QuestionConfig::AllowAudienceAnswer)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionConfig::AllowAudienceCreateQuestions)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuestionConfig::AutoPublish).boolean().not_null())
                    .col(
                        ColumnDef::new(QuestionConfig::AllowAudienceVoteQuestions)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionConfig::AllowAudienceVoteAnswers)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionConfig::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per event; a default config is referenced by at most one event
        manager
            .create_table(
                Table::create()
                    .table(EventConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventConfig::EventId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EventConfig::DefaultPollConfigId)
                            .string_len(32)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(EventConfig::DefaultQuestionConfigId)
                            .string_len(32)
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(EventConfig::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(EventConfig::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_config_default_poll_config")
                            .from(EventConfig::Table, EventConfig::DefaultPollConfigId)
                            .to(PollConfig::Table, PollConfig::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_config_default_question_config")
                            .from(EventConfig::Table, EventConfig::DefaultQuestionConfigId)
                            .to(QuestionConfig::Table, QuestionConfig::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventConfig::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(QuestionConfig::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PollConfig::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PollConfig {
    Table,
    Id,
    AnswersPrivacy,
    PresentToAudience,
    Enabled,
    MultipleAnswers,
    AllowNoLimitedAnswering,
    AnsweringTimeLimit,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum QuestionConfig {
    Table,
    Id,
    AnswersPrivacy,
    PresentToAudience,
    Enabled,
    AllowAudienceAnswer,
    AllowAudienceCreateQuestions,
    AutoPublish,
    AllowAudienceVoteQuestions,
    AllowAudienceVoteAnswers,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EventConfig {
    Table,
    EventId,
    DefaultPollConfigId,
    DefaultQuestionConfigId,
    CreatedAt,
    UpdatedAt,
}
