//! Event configuration entity holding the per-event defaults.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_config")]
pub struct Model {
    /// Watchit identifier of the event
    #[sea_orm(primary_key, auto_increment = false)]
    pub event_id: String,

    #[sea_orm(nullable, unique)]
    pub default_poll_config_id: Option<String>,

    #[sea_orm(nullable, unique)]
    pub default_question_config_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::poll_config::Entity",
        from = "Column::DefaultPollConfigId",
        to = "super::poll_config::Column::Id",
        on_delete = "SetNull"
    )]
    DefaultPollConfig,

    #[sea_orm(
        belongs_to = "super::question_config::Entity",
        from = "Column::DefaultQuestionConfigId",
        to = "super::question_config::Column::Id",
        on_delete = "SetNull"
    )]
    DefaultQuestionConfig,
}

impl Related<super::poll_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DefaultPollConfig.def()
    }
}

impl Related<super::question_config::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DefaultQuestionConfig.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
