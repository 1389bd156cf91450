//! Participant entity: local shadow of a remote identity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where a participant's identity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantKind {
    /// Platform account resolved through the identity service.
    #[sea_orm(string_value = "SYSTEM")]
    System,
    /// Viewer identified by a form-submitted session payload.
    #[sea_orm(string_value = "PARTICIPANT")]
    Participant,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Remote account username (email for session participants)
    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    pub screen_name: String,

    pub kind: ParticipantKind,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
