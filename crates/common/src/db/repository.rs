//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations with proper
//! error handling. Methods that participate in a caller-owned transaction
//! are generic over `ConnectionTrait` and take the transaction explicitly;
//! plain reads go to the replica when one is configured.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, Statement,
};
use uuid::Uuid;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for transaction begin in the service layer
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Find user by ID
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Count articles owned by a user
    pub async fn count_articles<C: ConnectionTrait>(&self, conn: &C, user_id: Uuid) -> Result<u64> {
        ArticleEntity::find()
            .filter(ArticleColumn::UserId.eq(user_id))
            .count(conn)
            .await
            .map_err(Into::into)
    }

    /// Find an article by ID, scoped to its owner
    pub async fn find_article_owned(
        &self,
        user_id: Uuid,
        article_id: Uuid,
    ) -> Result<Option<Article>> {
        ArticleEntity::find_by_id(article_id)
            .filter(ArticleColumn::UserId.eq(user_id))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Probe for an article of this user matching the url or (when given) the
    /// doi, optionally excluding one article id (the row being updated).
    ///
    /// Pre-flight only: the storage-level unique constraints on
    /// (user_id, url) and (user_id, doi) remain the real guarantee.
    pub async fn find_duplicate_article<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        url: &str,
        doi: Option<&str>,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<Article>> {
        let mut matcher = Condition::any().add(ArticleColumn::Url.eq(url));
        if let Some(doi) = doi.filter(|d| !d.is_empty()) {
            matcher = matcher.add(ArticleColumn::Doi.eq(doi));
        }

        let mut query = ArticleEntity::find()
            .filter(ArticleColumn::UserId.eq(user_id))
            .filter(matcher);

        if let Some(id) = exclude_id {
            query = query.filter(ArticleColumn::Id.ne(id));
        }

        query.one(conn).await.map_err(Into::into)
    }

    /// List articles for a user, newest first
    pub async fn list_articles(&self, user_id: Uuid) -> Result<Vec<Article>> {
        ArticleEntity::find()
            .filter(ArticleColumn::UserId.eq(user_id))
            .order_by_desc(ArticleColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a new article row
    pub async fn insert_article<C: ConnectionTrait>(
        &self,
        conn: &C,
        article: ArticleActiveModel,
    ) -> Result<Article> {
        article.insert(conn).await.map_err(Into::into)
    }

    /// Apply a partial update to an article row
    pub async fn update_article<C: ConnectionTrait>(
        &self,
        conn: &C,
        article: ArticleActiveModel,
    ) -> Result<Article> {
        article.update(conn).await.map_err(Into::into)
    }

    /// Delete an article by ID; author links go with it via cascade.
    /// Author rows are never deleted here, even if unreferenced afterwards.
    pub async fn delete_article(&self, article_id: Uuid) -> Result<bool> {
        let result = ArticleEntity::delete_by_id(article_id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Author Directory Operations
    // ========================================================================

    /// Find an author by exact name match
    pub async fn find_author_by_name<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> Result<Option<Author>> {
        AuthorEntity::find()
            .filter(AuthorColumn::Name.eq(name))
            .one(conn)
            .await
            .map_err(Into::into)
    }

    /// Atomically insert an author unless the name already exists.
    ///
    /// Returns the new author's id, or `None` when a row with this name is
    /// already present (including one committed by a concurrent writer
    /// between any earlier lookup and this insert).
    pub async fn insert_author_if_absent<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> Result<Option<Uuid>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO authors (id, name, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
            vec![Uuid::new_v4().into(), name.into()],
        );

        let row = conn.query_one_raw(stmt).await?;
        match row {
            Some(row) => {
                let id = row
                    .try_get_by_index::<Uuid>(0)
                    .map_err(sea_orm::DbErr::from)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Fetch the linked authors for an article (unordered relation; display
    /// order lives in the cached display string)
    pub async fn find_article_authors(&self, article_id: Uuid) -> Result<Vec<Author>> {
        let links = ArticleAuthorEntity::find()
            .filter(ArticleAuthorColumn::ArticleId.eq(article_id))
            .find_also_related(AuthorEntity)
            .all(self.read_conn())
            .await?;

        Ok(links.into_iter().filter_map(|(_, author)| author).collect())
    }

    // ========================================================================
    // Article-Author Link Operations
    // ========================================================================

    /// Delete every author link for an article
    pub async fn clear_article_authors<C: ConnectionTrait>(
        &self,
        conn: &C,
        article_id: Uuid,
    ) -> Result<u64> {
        let result = ArticleAuthorEntity::delete_many()
            .filter(ArticleAuthorColumn::ArticleId.eq(article_id))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Insert one article-author link, ignoring an already-existing pair
    pub async fn link_article_author<C: ConnectionTrait>(
        &self,
        conn: &C,
        article_id: Uuid,
        author_id: Uuid,
    ) -> Result<()> {
        let link = ArticleAuthorActiveModel {
            article_id: Set(article_id),
            author_id: Set(author_id),
        };

        ArticleAuthorEntity::insert(link)
            .on_conflict(
                OnConflict::columns([
                    ArticleAuthorColumn::ArticleId,
                    ArticleAuthorColumn::AuthorId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Ok(())
    }

    /// Persist the cached display string for an article
    pub async fn set_authors_display<C: ConnectionTrait>(
        &self,
        conn: &C,
        article_id: Uuid,
        display: &str,
    ) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE articles SET authors_display = $1, updated_at = NOW() WHERE id = $2",
            vec![display.into(), article_id.into()],
        );

        conn.execute_raw(stmt).await?;
        Ok(())
    }

    // ========================================================================
    // Temp Session / Temp Article Operations
    // ========================================================================

    /// Find a temp session by its external key
    pub async fn find_temp_session(&self, session_id: &str) -> Result<Option<TempSession>> {
        TempSessionEntity::find_by_id(session_id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find or create the temp session row for an external key
    pub async fn ensure_temp_session(&self, session_id: &str) -> Result<TempSession> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"
            INSERT INTO temp_sessions (id, created_at)
            VALUES ($1, NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
            vec![session_id.into()],
        );

        self.write_conn().execute_raw(stmt).await?;

        TempSessionEntity::find_by_id(session_id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| crate::errors::AppError::SessionNotFound {
                id: session_id.to_string(),
            })
    }

    /// Insert a temp article row
    pub async fn insert_temp_article(
        &self,
        article: TempArticleActiveModel,
    ) -> Result<TempArticle> {
        article.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// List temp articles for a session, oldest first (save order)
    pub async fn list_temp_articles(&self, session_id: &str) -> Result<Vec<TempArticle>> {
        TempArticleEntity::find()
            .filter(TempArticleColumn::SessionId.eq(session_id))
            .order_by_asc(TempArticleColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete every temp article of a session and the session row itself
    pub async fn delete_temp_session<C: ConnectionTrait>(
        &self,
        conn: &C,
        session_id: &str,
    ) -> Result<u64> {
        let articles = TempArticleEntity::delete_many()
            .filter(TempArticleColumn::SessionId.eq(session_id))
            .exec(conn)
            .await?;

        TempSessionEntity::delete_by_id(session_id)
            .exec(conn)
            .await?;

        Ok(articles.rows_affected)
    }
}
