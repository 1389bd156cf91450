//! Create vote table migration.

use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_participant_table::Participant;
use super::m20261018_000003_create_interaction_tables::Question;
use super::m20261018_000004_create_answer_tables::QuestionAnswer;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vote::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Vote::ParticipantId).string_len(32).not_null())
                    .col(ColumnDef::new(Vote::QuestionId).string_len(32))
                    .col(ColumnDef::new(Vote::AnswerId).string_len(32))
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Exactly one target
                    .check(
                        Expr::expr(Expr::col(Vote::QuestionId).is_null())
                            .ne(Expr::col(Vote::AnswerId).is_null()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_participant")
                            .from(Vote::Table, Vote::ParticipantId)
                            .to(Participant::Table, Participant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_question")
                            .from(Vote::Table, Vote::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_answer")
                            .from(Vote::Table, Vote::AnswerId)
                            .to(QuestionAnswer::Table, QuestionAnswer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: one vote per participant per question
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_participant_question_unique")
                    .table(Vote::Table)
                    .col(Vote::ParticipantId)
                    .col(Vote::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: one vote per participant per answer
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_participant_answer_unique")
                    .table(Vote::Table)
                    .col(Vote::ParticipantId)
                    .col(Vote::AnswerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: question_id / answer_id (for counting)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_question_id")
                    .table(Vote::Table)
                    .col(Vote::QuestionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vote_answer_id")
                    .table(Vote::Table)
                    .col(Vote::AnswerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Vote {
    Table,
    Id,
    ParticipantId,
    QuestionId,
    AnswerId,
    CreatedAt,
}
