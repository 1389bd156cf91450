//! Create poll_answer, poll_answer_choice and question_answer tables migration.

use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_participant_table::Participant;
use super::m20261018_000003_create_interaction_tables::{Choice, Poll, Question};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PollAnswer::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PollAnswer::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(PollAnswer::PollId).string_len(32).not_null())
                    .col(ColumnDef::new(PollAnswer::ParticipantId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PollAnswer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_answer_poll")
                            .from(PollAnswer::Table, PollAnswer::PollId)
                            .to(Poll::Table, Poll::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_answer_participant")
                            .from(PollAnswer::Table, PollAnswer::ParticipantId)
                            .to(Participant::Table, Participant::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_poll_answer_poll_id")
                    .table(PollAnswer::Table)
                    .col(PollAnswer::PollId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PollAnswerChoice::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PollAnswerChoice::AnswerId).string_len(32).not_null())
                    .col(ColumnDef::new(PollAnswerChoice::ChoiceId).string_len(32).not_null())
                    .primary_key(
                        Index::create()
                            .col(PollAnswerChoice::AnswerId)
                            .col(PollAnswerChoice::ChoiceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_answer_choice_answer")
                            .from(PollAnswerChoice::Table, PollAnswerChoice::AnswerId)
                            .to(PollAnswer::Table, PollAnswer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_poll_answer_choice_choice")
                            .from(PollAnswerChoice::Table, PollAnswerChoice::ChoiceId)
                            .to(Choice::Table, Choice::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(QuestionAnswer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionAnswer::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuestionAnswer::QuestionId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(QuestionAnswer::ParticipantId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuestionAnswer::Text).string_len(256).not_null())
                    .col(
                        ColumnDef::new(QuestionAnswer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_answer_question")
                            .from(QuestionAnswer::Table, QuestionAnswer::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_answer_participant")
                            .from(QuestionAnswer::Table, QuestionAnswer::ParticipantId)
                            .to(Participant::Table, Participant::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_question_answer_question_id")
                    .table(QuestionAnswer::Table)
                    .col(QuestionAnswer::QuestionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuestionAnswer::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PollAnswerChoice::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PollAnswer::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PollAnswer {
    Table,
    Id,
    PollId,
    ParticipantId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PollAnswerChoice {
    Table,
    AnswerId,
    ChoiceId,
}

#[derive(DeriveIden)]
pub enum QuestionAnswer {
    Table,
    Id,
    QuestionId,
    ParticipantId,
    Text,
    CreatedAt,
}
