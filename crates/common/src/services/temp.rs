//! Temp store
//!
//! Article rows scoped to an anonymous session identifier. Structurally the
//! article shape minus the relational author link; authors are kept as the
//! normalized display text until migration links them for real.

use crate::authors::{display_string, normalize_authors, AuthorInput};
use crate::db::models::{TempArticle, TempArticleActiveModel};
use crate::db::Repository;
use crate::errors::Result;
use crate::services::articles::{normalize_doi, ArticleFields};
use sea_orm::Set;
use uuid::Uuid;

/// Service for anonymous-session article operations
#[derive(Clone)]
pub struct TempService {
    repo: Repository,
}

impl TempService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Save an article under an anonymous session, creating the session row
    /// on first use. No quota, no uniqueness enforcement; duplicates are
    /// suppressed later at migration time.
    pub async fn create_temp_article(
        &self,
        session_id: &str,
        mut fields: ArticleFields,
        authors: AuthorInput,
    ) -> Result<TempArticle> {
        fields.doi = normalize_doi(fields.doi);

        let session = self.repo.ensure_temp_session(session_id).await?;

        let names = normalize_authors(&authors);
        let now = chrono::Utc::now();

        let article = TempArticleActiveModel {
            id: Set(Uuid::new_v4()),
            session_id: Set(session.id.clone()),
            title: Set(fields.title),
            url: Set(fields.url),
            doi: Set(fields.doi),
            authors_display: Set(display_string(&names)),
            journal: Set(fields.journal),
            abstract_text: Set(fields.abstract_text),
            price: Set(fields.price),
            purchased_at: Set(fields.purchased_at),
            tags: Set(serde_json::json!(fields.tags)),
            file_key: Set(fields.file_key),
            created_at: Set(now.into()),
        };

        let article = self.repo.insert_temp_article(article).await?;

        tracing::info!(
            temp_article_id = %article.id,
            session_id = %session.id,
            "Temp article saved"
        );

        Ok(article)
    }

    /// List the session's saved articles in save order
    pub async fn list(&self, session_id: &str) -> Result<Vec<TempArticle>> {
        self.repo.list_temp_articles(session_id).await
    }
}
