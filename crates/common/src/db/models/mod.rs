//! SeaORM entity models
//!
//! Database entities for the LitKeep library core

mod article;
mod article_author;
mod author;
mod temp_article;
mod temp_session;
mod user;

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
};

pub use article_author::{
    Entity as ArticleAuthorEntity,
    Model as ArticleAuthor,
    ActiveModel as ArticleAuthorActiveModel,
    Column as ArticleAuthorColumn,
};

pub use author::{
    Entity as AuthorEntity,
    Model as Author,
    ActiveModel as AuthorActiveModel,
    Column as AuthorColumn,
};

pub use temp_article::{
    Entity as TempArticleEntity,
    Model as TempArticle,
    ActiveModel as TempArticleActiveModel,
    Column as TempArticleColumn,
};

pub use temp_session::{
    Entity as TempSessionEntity,
    Model as TempSession,
    ActiveModel as TempSessionActiveModel,
    Column as TempSessionColumn,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    PlanTier,
};
