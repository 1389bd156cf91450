//! Poll entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Event the poll belongs to
    #[sea_orm(indexed)]
    pub event_id: String,

    pub creator_id: String,

    pub question: String,

    /// Owned configuration (never an event default)
    #[sea_orm(unique)]
    pub config_id: String,

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
        belongs_to = "super::poll_config::Entity",
        from = "Column::ConfigId",
        to = "super::poll_config::Column::Id",
        on_delete = "Restrict"
    )]
    Config,

    #[sea_orm(has_many = "super::choice::Entity")]
    Choices,

    #[sea_orm(has_many = "super::poll_answer::Entity")]
    Answers,
}

impl Related<super::participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::poll_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Config.def()
    }
}

impl Related<super::choice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Choices.def()
    }
}

impl Related<super::poll_answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
