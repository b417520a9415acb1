//! Article store
//!
//! Owns article rows scoped to a permanent user: create/update/delete/list
//! with per-user uniqueness on url and doi, the free-plan quota check, and
//! author linking kept in sync on every write.

use crate::authors::AuthorInput;
use crate::db::models::{Article, ArticleActiveModel, Author};
use crate::db::Repository;
use crate::errors::{is_unique_violation, AppError, Result};
use crate::services::authors::set_article_authors;
use sea_orm::{Set, TransactionTrait};
use uuid::Uuid;

/// Article metadata as supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct ArticleFields {
    pub title: String,
    pub url: String,
    pub doi: Option<String>,
    pub journal: Option<String>,
    pub abstract_text: Option<String>,
    pub price: Option<f64>,
    pub purchased_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    pub tags: Vec<String>,
    pub file_key: Option<String>,
}

/// Partial update; `None` leaves the field untouched.
///
/// `authors: None` leaves the author links and display string as they are,
/// which is a different state from `Some` of an empty input (clears both).
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
    pub journal: Option<String>,
    pub abstract_text: Option<String>,
    pub price: Option<f64>,
    pub purchased_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    pub tags: Option<Vec<String>>,
    pub file_key: Option<String>,
    pub authors: Option<AuthorInput>,
}

/// Service for user-owned article operations
#[derive(Clone)]
pub struct ArticleService {
    repo: Repository,
    free_plan_limit: u64,
}

impl ArticleService {
    pub fn new(repo: Repository, free_plan_limit: u64) -> Self {
        Self {
            repo,
            free_plan_limit,
        }
    }

    /// Create an article for a user and link its authors, in one transaction.
    ///
    /// Quota is checked before the duplicate check; both happen before any
    /// write. A concurrent duplicate that slips past the pre-flight check is
    /// rejected by the storage unique constraint and surfaced the same way.
    pub async fn create(
        &self,
        user_id: Uuid,
        mut fields: ArticleFields,
        authors: AuthorInput,
    ) -> Result<Article> {
        fields.doi = normalize_doi(fields.doi);

        let user = self
            .repo
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: user_id.to_string(),
            })?;

        let txn = self.repo.pool().write().begin().await?;

        if user.is_free_plan() {
            let count = self.repo.count_articles(&txn, user_id).await?;
            if count >= self.free_plan_limit {
                return Err(AppError::QuotaExceeded {
                    limit: self.free_plan_limit,
                });
            }
        }

        if let Some(existing) = self
            .repo
            .find_duplicate_article(&txn, user_id, &fields.url, fields.doi.as_deref(), None)
            .await?
        {
            return Err(duplicate_error(&existing, &fields.url));
        }

        let now = chrono::Utc::now();
        let article = ArticleActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(fields.title),
            url: Set(fields.url.clone()),
            doi: Set(fields.doi),
            authors_display: Set(String::new()),
            journal: Set(fields.journal),
            abstract_text: Set(fields.abstract_text),
            price: Set(fields.price),
            purchased_at: Set(fields.purchased_at),
            tags: Set(serde_json::json!(fields.tags)),
            file_key: Set(fields.file_key),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let article = self
            .repo
            .insert_article(&txn, article)
            .await
            .map_err(map_unique_to_conflict)?;

        let authors_display = set_article_authors(&self.repo, &txn, article.id, &authors).await?;

        txn.commit().await?;

        crate::metrics::record_article_write("create");
        tracing::info!(
            article_id = %article.id,
            user_id = %user_id,
            authors = %authors_display,
            "Article created"
        );

        Ok(Article {
            authors_display,
            ..article
        })
    }

    /// Apply a partial update; the duplicate check excludes the article
    /// itself. Author links are only touched when `update.authors` is given.
    pub async fn update(
        &self,
        user_id: Uuid,
        article_id: Uuid,
        update: ArticleUpdate,
    ) -> Result<Article> {
        let existing = self
            .repo
            .find_article_owned(user_id, article_id)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound {
                id: article_id.to_string(),
            })?;

        let txn = self.repo.pool().write().begin().await?;

        let effective_url = update.url.clone().unwrap_or_else(|| existing.url.clone());
        // A provided empty doi clears the field, so the probe must not fall
        // back to the stored value in that case.
        let effective_doi = match update.doi.clone() {
            Some(doi) => normalize_doi(Some(doi)),
            None => normalize_doi(existing.doi.clone()),
        };

        if let Some(dup) = self
            .repo
            .find_duplicate_article(
                &txn,
                user_id,
                &effective_url,
                effective_doi.as_deref(),
                Some(article_id),
            )
            .await?
        {
            return Err(duplicate_error(&dup, &effective_url));
        }

        let mut model: ArticleActiveModel = existing.into();
        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(url) = update.url {
            model.url = Set(url);
        }
        if let Some(doi) = update.doi {
            model.doi = Set(normalize_doi(Some(doi)));
        }
        if let Some(journal) = update.journal {
            model.journal = Set(Some(journal));
        }
        if let Some(abstract_text) = update.abstract_text {
            model.abstract_text = Set(Some(abstract_text));
        }
        if let Some(price) = update.price {
            model.price = Set(Some(price));
        }
        if let Some(purchased_at) = update.purchased_at {
            model.purchased_at = Set(Some(purchased_at));
        }
        if let Some(tags) = update.tags {
            model.tags = Set(serde_json::json!(tags));
        }
        if let Some(file_key) = update.file_key {
            model.file_key = Set(Some(file_key));
        }
        model.updated_at = Set(chrono::Utc::now().into());

        let article = self
            .repo
            .update_article(&txn, model)
            .await
            .map_err(map_unique_to_conflict)?;

        let article = match update.authors {
            Some(ref authors) => {
                let display = set_article_authors(&self.repo, &txn, article_id, authors).await?;
                Article {
                    authors_display: display,
                    ..article
                }
            }
            None => article,
        };

        txn.commit().await?;

        crate::metrics::record_article_write("update");
        tracing::info!(article_id = %article_id, user_id = %user_id, "Article updated");

        Ok(article)
    }

    /// Delete an article. Links cascade; author rows are retained.
    pub async fn delete(&self, user_id: Uuid, article_id: Uuid) -> Result<()> {
        self.repo
            .find_article_owned(user_id, article_id)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound {
                id: article_id.to_string(),
            })?;

        self.repo.delete_article(article_id).await?;

        crate::metrics::record_article_write("delete");
        tracing::info!(article_id = %article_id, user_id = %user_id, "Article deleted");

        Ok(())
    }

    /// List a user's articles, newest first, each carrying its persisted
    /// display string.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Article>> {
        self.repo.list_articles(user_id).await
    }

    /// Fetch one owned article together with its linked authors
    pub async fn get(&self, user_id: Uuid, article_id: Uuid) -> Result<(Article, Vec<Author>)> {
        let article = self
            .repo
            .find_article_owned(user_id, article_id)
            .await?
            .ok_or_else(|| AppError::ArticleNotFound {
                id: article_id.to_string(),
            })?;

        let authors = self.repo.find_article_authors(article_id).await?;

        Ok((article, authors))
    }
}

/// Coerce an empty or whitespace-only doi to `None`.
///
/// Uniqueness only applies to articles that carry a doi: the partial unique
/// index keys on non-NULL values and the duplicate probe skips empty ones,
/// so an empty string must never reach storage as a value. Applied at every
/// write path that persists a doi.
pub(crate) fn normalize_doi(doi: Option<String>) -> Option<String> {
    doi.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

/// Build the conflict error for a duplicate probe hit
fn duplicate_error(existing: &Article, requested_url: &str) -> AppError {
    if existing.url == requested_url {
        AppError::DuplicateArticle {
            field: "url".to_string(),
            value: requested_url.to_string(),
        }
    } else {
        AppError::DuplicateArticle {
            field: "doi".to_string(),
            value: existing.doi.clone().unwrap_or_default(),
        }
    }
}

/// Map a storage unique violation (a duplicate racing past the pre-flight
/// check) to the same conflict error the pre-flight produces.
fn map_unique_to_conflict(err: AppError) -> AppError {
    match err {
        AppError::Database(ref db_err) if is_unique_violation(db_err) => AppError::Conflict {
            message: "article with this url or doi already saved".to_string(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::User;
    use crate::db::DbPool;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    const LIMIT: u64 = 10;

    fn owner(plan: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "reader@example.com".into(),
            plan: plan.into(),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    fn stored(url: &str, doi: Option<&str>, display: &str) -> Article {
        Article {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "T".into(),
            url: url.into(),
            doi: doi.map(Into::into),
            authors_display: display.into(),
            journal: None,
            abstract_text: None,
            price: None,
            purchased_at: None,
            tags: serde_json::json!([]),
            file_key: None,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    fn fields(url: &str, doi: Option<&str>) -> ArticleFields {
        ArticleFields {
            title: "T".into(),
            url: url.into(),
            doi: doi.map(Into::into),
            ..Default::default()
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    fn service(conn: DatabaseConnection) -> ArticleService {
        let pool = DbPool {
            primary: conn,
            replica: None,
        };
        ArticleService::new(Repository::new(pool), LIMIT)
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[test]
    fn test_normalize_doi_coerces_empty_to_none() {
        assert_eq!(normalize_doi(None), None);
        assert_eq!(normalize_doi(Some(String::new())), None);
        assert_eq!(normalize_doi(Some("   ".into())), None);
        assert_eq!(normalize_doi(Some(" 10.1/abc ".into())), Some("10.1/abc".into()));
        assert_eq!(normalize_doi(Some("10.1/abc".into())), Some("10.1/abc".into()));
    }

    #[test]
    fn test_duplicate_error_field_selection() {
        let article = stored("http://x", Some("10.1/abc"), "");

        match duplicate_error(&article, "http://x") {
            AppError::DuplicateArticle { field, value } => {
                assert_eq!(field, "url");
                assert_eq!(value, "http://x");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Different url means the probe matched on doi
        match duplicate_error(&article, "http://y") {
            AppError::DuplicateArticle { field, value } => {
                assert_eq!(field, "doi");
                assert_eq!(value, "10.1/abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_free_plan_at_limit() {
        let user = owner("free");
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![count_row(LIMIT as i64)]])
            .into_connection();

        let err = service(conn)
            .create(user.id, fields("http://a", None), AuthorInput::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::QuotaExceeded { limit: LIMIT }));
    }

    #[tokio::test]
    async fn test_create_skips_quota_check_for_pro_plan() {
        let user = owner("pro");
        let inserted = stored("http://a", None, "");

        // No count result is queued: a pro-plan create must not issue one.
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([Vec::<Article>::new()])
            .append_query_results([vec![inserted.clone()]])
            .append_exec_results([exec_ok(0), exec_ok(1)])
            .into_connection();

        let created = service(conn)
            .create(user.id, fields("http://a", None), AuthorInput::default())
            .await
            .unwrap();

        assert_eq!(created.id, inserted.id);
    }

    #[tokio::test]
    async fn test_create_duplicate_preflight_rejects_before_any_insert() {
        let user = owner("free");
        let existing = stored("http://a", None, "");

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![count_row(0)]])
            .append_query_results([vec![existing]])
            .into_connection();
        let log_handle = conn.clone();

        let err = service(conn)
            .create(user.id, fields("http://a", None), AuthorInput::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateArticle { .. }));
        let log = format!("{:?}", log_handle.into_transaction_log());
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn test_update_empty_doi_clears_stored_value() {
        let existing = stored("http://a", Some("10.1/x"), "Jane Doe");
        let user_id = existing.user_id;
        let article_id = existing.id;
        let after = Article {
            doi: None,
            ..existing.clone()
        };

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .append_query_results([Vec::<Article>::new()])
            .append_query_results([vec![after]])
            .into_connection();
        let log_handle = conn.clone();

        let update = ArticleUpdate {
            doi: Some(String::new()),
            ..Default::default()
        };
        let updated = service(conn).update(user_id, article_id, update).await.unwrap();

        assert_eq!(updated.doi, None);
        // Neither the duplicate probe nor the UPDATE may carry '' as a value
        let log = format!("{:?}", log_handle.into_transaction_log());
        assert!(!log.contains(r#"String(Some(""))"#));
    }

    #[tokio::test]
    async fn test_update_omitted_authors_leaves_links_untouched() {
        let existing = stored("http://a", None, "Jane Doe");
        let user_id = existing.user_id;
        let article_id = existing.id;

        // No exec results queued: touching the author links would fail here.
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([Vec::<Article>::new()])
            .append_query_results([vec![existing]])
            .into_connection();

        let update = ArticleUpdate {
            title: Some("New".into()),
            ..Default::default()
        };
        let updated = service(conn).update(user_id, article_id, update).await.unwrap();

        assert_eq!(updated.authors_display, "Jane Doe");
    }

    #[tokio::test]
    async fn test_update_empty_authors_clears_links_and_display() {
        let existing = stored("http://a", None, "Jane Doe");
        let user_id = existing.user_id;
        let article_id = existing.id;

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .append_query_results([Vec::<Article>::new()])
            .append_query_results([vec![existing]])
            // link clear, display string update
            .append_exec_results([exec_ok(1), exec_ok(1)])
            .into_connection();

        let update = ArticleUpdate {
            authors: Some(AuthorInput::List(vec![])),
            ..Default::default()
        };
        let updated = service(conn).update(user_id, article_id, update).await.unwrap();

        assert_eq!(updated.authors_display, "");
    }
}
