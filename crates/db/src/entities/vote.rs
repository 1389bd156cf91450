//! Vote entity: a participant endorsing a question or a question answer.
//!
//! Exactly one of `question_id` / `answer_id` is set. Unique indexes on
//! `(participant_id, question_id)` and `(participant_id, answer_id)` make a
//! row's existence equivalent to "this participant currently endorses this
//! target".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a vote points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A question.
    Question,
    /// An answer to a question.
    Answer,
}

impl TargetKind {
    /// Column holding the target id for this kind.
    #[must_use]
    pub const fn column(self) -> Column {
        match self {
            Self::Question => Column::QuestionId,
            Self::Answer => Column::AnswerId,
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Question => f.write_str("question"),
            Self::Answer => f.write_str("answer"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub participant_id: String,

    #[sea_orm(nullable)]
    pub question_id: Option<String>,

    #[sea_orm(nullable)]
    pub answer_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::participant::Entity",
        from = "Column::ParticipantId",
        to = "super::participant::Column::Id",
        on_delete = "Cascade"
    )]
    Participant,

    #[sea_orm(
        belongs_to = "super::question::Entity",
        from = "Column::QuestionId",
        to = "super::question::Column::Id",
        on_delete = "Cascade"
    )]
    Question,

    #[sea_orm(
        belongs_to = "super::question_answer::Entity",
        from = "Column::AnswerId",
        to = "super::question_answer::Column::Id",
        on_delete = "Cascade"
    )]
    Answer,
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participant.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl Related<super::question_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
