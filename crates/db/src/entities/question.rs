//! Question entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    pub creator_id: String,

    pub question: String,

    #[sea_orm(unique)]
    pub config_id: String,

    /// Derived from the configuration's `auto_publish` at creation
    pub published: bool,

    pub streaming: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::participant::Entity",
        from = "Column::CreatorId",
        to = "super::participant::Column::Id"
    )]
    Creator,

    #[sea_orm(
        belongs_to = "super::question_config::Entity",
        from = "Column::ConfigId",
        to = "super::question_config::Column::Id",
        on_delete = "Restrict"
    )]
    Config,

    #[sea_orm(has_many = "super::question_answer::Entity")]
    Answers,

    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::question_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Config.def()
    }
}

impl Related<super::question_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
