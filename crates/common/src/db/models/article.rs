//! Article entity
//!
//! `authors_display` is a cache: the comma-joined names currently linked via
//! `article_authors`, in the order supplied at the last author write. The
//! linker is its only writer, on the same transaction as the link mutation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

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

    /// Tag list as JSONB
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: serde_json::Value,

    /// Reference to the stored PDF, owned by the external file store
    #[sea_orm(column_type = "Text", nullable)]
    pub file_key: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(has_many = "super::article_author::Entity")]
    AuthorLinks,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::article_author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
