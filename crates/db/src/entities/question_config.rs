//! Question configuration entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::poll_config::AnswersPrivacy;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub answers_privacy: AnswersPrivacy,

    pub present_to_audience: bool,

    /// Whether the Q&A component is enabled
    pub enabled: bool,

    pub allow_audience_answer: bool,

    pub allow_audience_create_questions: bool,

    /// Questions are published as soon as they are created
    pub auto_publish: bool,

    pub allow_audience_vote_questions: bool,

    pub allow_audience_vote_answers: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::question::Entity")]
    Question,
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
