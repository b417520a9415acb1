//! Migration engine
//!
//! Moves an anonymous session's temp articles into a permanent account,
//! exactly once per session, with duplicate suppression. Two phases:
//! drain (one transaction per temp article, independent outcomes) and
//! cleanup (delete the session and its temp rows unconditionally). The
//! sequence is idempotent under retry: a crash before cleanup leaves the
//! temp rows in place, and a re-run skips the already-migrated articles as
//! duplicates before cleaning up.

use crate::authors::AuthorInput;
use crate::db::models::{ArticleActiveModel, TempArticle};
use crate::db::Repository;
use crate::errors::{is_unique_violation, AppError, Result};
use crate::services::articles::normalize_doi;
use crate::services::authors::set_article_authors;
use sea_orm::{Set, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

/// Per-article migration outcome
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Copied into the target library as a new article
    Migrated {
        temp_article_id: Uuid,
        article_id: Uuid,
    },
    /// The target user already owns an article with this url or doi;
    /// the temp article is dropped without merging.
    SkippedDuplicate { temp_article_id: Uuid },
    /// The per-article transaction rolled back; the drain loop continues.
    Failed {
        temp_article_id: Uuid,
        error: String,
    },
}

/// Result of draining one session
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub session_id: String,
    pub migrated_count: u64,
    pub skipped_count: u64,
    pub failed_count: u64,
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationReport {
    fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: MigrationOutcome) {
        match outcome {
            MigrationOutcome::Migrated { .. } => self.migrated_count += 1,
            MigrationOutcome::SkippedDuplicate { .. } => self.skipped_count += 1,
            MigrationOutcome::Failed { .. } => self.failed_count += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Service that drains temp sessions into permanent accounts
#[derive(Clone)]
pub struct MigrationService {
    repo: Repository,
}

impl MigrationService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Migrate every temp article of `session_id` into `target_user_id`'s
    /// library, then delete the session and its temp rows.
    ///
    /// An absent session yields an empty report: either it was never
    /// created, or a previous run already cleaned it up. Zero migrated with
    /// cleanup performed is a valid outcome, not an error.
    pub async fn migrate_session(
        &self,
        session_id: &str,
        target_user_id: Uuid,
    ) -> Result<MigrationReport> {
        self.repo
            .find_user_by_id(target_user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound {
                id: target_user_id.to_string(),
            })?;

        let mut report = MigrationReport::new(session_id);

        if self.repo.find_temp_session(session_id).await?.is_none() {
            tracing::debug!(session_id = %session_id, "No temp session to migrate");
            return Ok(report);
        }

        // Drain: sequential per-item transactions, independent outcomes.
        let temp_articles = self.repo.list_temp_articles(session_id).await?;
        for temp_article in &temp_articles {
            let outcome = match self.migrate_one(target_user_id, temp_article).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(
                        temp_article_id = %temp_article.id,
                        session_id = %session_id,
                        error = %err,
                        "Temp article migration failed"
                    );
                    MigrationOutcome::Failed {
                        temp_article_id: temp_article.id,
                        error: err.to_string(),
                    }
                }
            };
            report.record(outcome);
        }

        // Cleanup: the session and its temp rows go together, regardless of
        // per-item outcomes.
        let txn = self.repo.pool().write().begin().await?;
        let removed = self.repo.delete_temp_session(&txn, session_id).await?;
        txn.commit().await?;

        crate::metrics::record_migration(&report);
        tracing::info!(
            session_id = %session_id,
            user_id = %target_user_id,
            migrated = report.migrated_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            temp_rows_removed = removed,
            "Session migrated"
        );

        Ok(report)
    }

    /// Duplicate check, copy and author linking for one temp article, as one
    /// atomic transaction.
    async fn migrate_one(
        &self,
        user_id: Uuid,
        temp_article: &TempArticle,
    ) -> Result<MigrationOutcome> {
        let txn = self.repo.pool().write().begin().await?;

        let duplicate = self
            .repo
            .find_duplicate_article(
                &txn,
                user_id,
                &temp_article.url,
                temp_article.doi.as_deref(),
                None,
            )
            .await?;

        if duplicate.is_some() {
            return Ok(MigrationOutcome::SkippedDuplicate {
                temp_article_id: temp_article.id,
            });
        }

        let now = chrono::Utc::now();
        let article = ArticleActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(temp_article.title.clone()),
            url: Set(temp_article.url.clone()),
            // Legacy temp rows may still carry an empty-string doi; coerce so
            // the copy never trips the doi uniqueness index on a non-value.
            doi: Set(normalize_doi(temp_article.doi.clone())),
            authors_display: Set(String::new()),
            journal: Set(temp_article.journal.clone()),
            abstract_text: Set(temp_article.abstract_text.clone()),
            price: Set(temp_article.price),
            purchased_at: Set(temp_article.purchased_at),
            tags: Set(temp_article.tags.clone()),
            file_key: Set(temp_article.file_key.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let article = match self.repo.insert_article(&txn, article).await {
            Ok(article) => article,
            // A concurrent writer created the duplicate after the probe;
            // same treatment as the pre-flight hit.
            Err(AppError::Database(ref db_err)) if is_unique_violation(db_err) => {
                return Ok(MigrationOutcome::SkippedDuplicate {
                    temp_article_id: temp_article.id,
                });
            }
            Err(err) => return Err(err),
        };

        let authors = AuthorInput::Text(temp_article.authors_display.clone());
        set_article_authors(&self.repo, &txn, article.id, &authors).await?;

        txn.commit().await?;

        Ok(MigrationOutcome::Migrated {
            temp_article_id: temp_article.id,
            article_id: article.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Article, Author, TempSession, User};
    use crate::db::DbPool;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn owner() -> User {
        User {
            id: Uuid::new_v4(),
            email: "reader@example.com".into(),
            plan: "free".into(),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    fn session(id: &str) -> TempSession {
        TempSession {
            id: id.into(),
            created_at: chrono::Utc::now().into(),
        }
    }

    fn temp(session_id: &str, url: &str, doi: Option<&str>, authors: &str) -> TempArticle {
        TempArticle {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            title: "T".into(),
            url: url.into(),
            doi: doi.map(Into::into),
            authors_display: authors.into(),
            journal: None,
            abstract_text: None,
            price: None,
            purchased_at: None,
            tags: serde_json::json!([]),
            file_key: None,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn stored(user_id: Uuid, url: &str) -> Article {
        Article {
            id: Uuid::new_v4(),
            user_id,
            title: "T".into(),
            url: url.into(),
            doi: None,
            authors_display: String::new(),
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

    fn service(conn: DatabaseConnection) -> MigrationService {
        let pool = DbPool {
            primary: conn,
            replica: None,
        };
        MigrationService::new(Repository::new(pool))
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_migrate_absent_session_yields_empty_report() {
        let user = owner();

        // No exec results queued: an absent session must not trigger cleanup.
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([Vec::<TempSession>::new()])
            .into_connection();

        let report = service(conn).migrate_session("anon-9", user.id).await.unwrap();

        assert_eq!(report.session_id, "anon-9");
        assert_eq!(report.migrated_count, 0);
        assert_eq!(report.skipped_count, 0);
        assert_eq!(report.failed_count, 0);
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_migrate_skips_duplicate_then_cleans_up() {
        let user = owner();
        let temp_article = temp("anon-1", "http://a", None, "Jane Doe");
        let temp_id = temp_article.id;

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![session("anon-1")]])
            .append_query_results([vec![temp_article]])
            // Duplicate probe hits the user's existing copy
            .append_query_results([vec![stored(user.id, "http://a")]])
            // Cleanup: temp article rows, then the session row
            .append_exec_results([exec_ok(1), exec_ok(1)])
            .into_connection();

        let report = service(conn).migrate_session("anon-1", user.id).await.unwrap();

        assert_eq!(report.migrated_count, 0);
        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.failed_count, 0);
        assert_eq!(
            report.outcomes,
            vec![MigrationOutcome::SkippedDuplicate {
                temp_article_id: temp_id,
            }]
        );
    }

    #[tokio::test]
    async fn test_migrate_copies_novel_article_and_links_authors() {
        let user = owner();
        // An empty-string doi must behave as no doi and never block the copy
        let temp_article = temp("anon-2", "http://b", Some(""), "Jane Doe");
        let temp_id = temp_article.id;
        let copied = stored(user.id, "http://b");
        let author_id = Uuid::new_v4();
        let author_row =
            BTreeMap::from([("id", Value::Uuid(Some(author_id)))]);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user.clone()]])
            .append_query_results([vec![session("anon-2")]])
            .append_query_results([vec![temp_article]])
            .append_query_results([Vec::<Article>::new()])
            .append_query_results([vec![copied.clone()]])
            // Author directory: lookup misses, insert-or-fetch wins the insert
            .append_query_results([Vec::<Author>::new()])
            .append_query_results([vec![author_row]])
            // Link clear, link insert, display string, then cleanup
            .append_exec_results([exec_ok(0), exec_ok(1), exec_ok(1), exec_ok(1), exec_ok(1)])
            .into_connection();

        let report = service(conn).migrate_session("anon-2", user.id).await.unwrap();

        assert_eq!(report.migrated_count, 1);
        assert_eq!(report.skipped_count, 0);
        assert_eq!(
            report.outcomes,
            vec![MigrationOutcome::Migrated {
                temp_article_id: temp_id,
                article_id: copied.id,
            }]
        );
    }

    #[test]
    fn test_report_accounting() {
        let mut report = MigrationReport::new("anon-1");
        let temp_id = Uuid::new_v4();

        report.record(MigrationOutcome::Migrated {
            temp_article_id: temp_id,
            article_id: Uuid::new_v4(),
        });
        report.record(MigrationOutcome::SkippedDuplicate {
            temp_article_id: Uuid::new_v4(),
        });
        report.record(MigrationOutcome::Failed {
            temp_article_id: Uuid::new_v4(),
            error: "boom".into(),
        });
        report.record(MigrationOutcome::Migrated {
            temp_article_id: Uuid::new_v4(),
            article_id: Uuid::new_v4(),
        });

        assert_eq!(report.migrated_count, 2);
        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.session_id, "anon-1");
    }

    #[test]
    fn test_empty_report_is_valid_done_state() {
        let report = MigrationReport::new("anon-2");
        assert_eq!(report.migrated_count, 0);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_outcome_serialization_tags() {
        let outcome = MigrationOutcome::SkippedDuplicate {
            temp_article_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped_duplicate");
    }
}
