//! Poll configuration entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who may see the results of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswersPrivacy {
    #[sea_orm(string_value = "EVERYONE")]
    Everyone,
    #[sea_orm(string_value = "CREATOR_AND_SPEAKERS")]
    CreatorAndSpeakers,
    #[sea_orm(string_value = "CREATOR")]
    Creator,
}

/// Allowed answering time limits in seconds (0 means unlimited).
pub const ANSWERING_TIME_LIMITS: [i32; 16] =
    [0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75];

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub answers_privacy: AnswersPrivacy,

    /// Whether polls are presented to the audience
    pub present_to_audience: bool,

    /// Whether the poll component is enabled
    pub enabled: bool,

    /// Whether an answer may select more than one choice
    pub multiple_answers: bool,

    pub allow_no_limited_answering: bool,

    /// Seconds, one of [`ANSWERING_TIME_LIMITS`]
    pub answering_time_limit: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::poll::Entity")]
    Poll,
}

impl Related<super::poll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Poll.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
