//! Anonymous session entity
//!
//! Keyed by the external session identifier string. Deleted together with
//! its temp articles once migration for the session has been attempted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "temp_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::temp_article::Entity")]
    TempArticles,
}

impl Related<super::temp_article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TempArticles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
