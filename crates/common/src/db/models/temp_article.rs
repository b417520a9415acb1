//! Temp article entity
//!
//! Mirrors the article shape minus the relational author link, scoped to an
//! anonymous session. Authors live only in the free-text display column
//! until migration normalizes and links them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "temp_articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub session_id: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub doi: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub authors_display: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub journal: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub abstract_text: Option<String>,

    pub price: Option<f64>,

    pub purchased_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "JsonBinary")]
    pub tags: serde_json::Value,

    #[sea_orm(column_type = "Text", nullable)]
    pub file_key: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::temp_session::Entity",
        from = "Column::SessionId",
        to = "super::temp_session::Column::Id"
    )]
    TempSession,
}

impl Related<super::temp_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TempSession.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
