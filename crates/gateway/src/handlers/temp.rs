//! Temp library handlers (save-without-login path)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::articles::CreateArticleRequest;
use crate::AppState;
use litkeep_common::{
    auth::SessionContext,
    db::models::TempArticle,
    db::Repository,
    errors::{AppError, Result},
    services::TempService,
};

/// Temp article representation returned by the API
#[derive(Serialize)]
pub struct TempArticleResponse {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub doi: Option<String>,
    pub authors: String,
    pub journal: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub tags: serde_json::Value,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct TempArticleListResponse {
    pub articles: Vec<TempArticleResponse>,
    pub total: usize,
}

impl TempArticleResponse {
    fn from_model(article: TempArticle) -> Self {
        Self {
            id: article.id,
            title: article.title,
            url: article.url,
            doi: article.doi,
            authors: article.authors_display,
            journal: article.journal,
            abstract_text: article.abstract_text,
            tags: article.tags,
            created_at: article.created_at.to_rfc3339(),
        }
    }
}

/// Save an article under the anonymous session
pub async fn create_temp_article(
    State(state): State<AppState>,
    session: SessionContext,
    Json(request): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<TempArticleResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let service = TempService::new(Repository::new(state.db.clone()));
    let (fields, authors) = request.into_parts();

    let article = service
        .create_temp_article(&session.session_id, fields, authors)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TempArticleResponse::from_model(article)),
    ))
}

/// List the anonymous session's saved articles
pub async fn list_temp_articles(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<TempArticleListResponse>> {
    let service = TempService::new(Repository::new(state.db.clone()));
    let articles = service.list(&session.session_id).await?;

    let articles: Vec<TempArticleResponse> = articles
        .into_iter()
        .map(TempArticleResponse::from_model)
        .collect();

    Ok(Json(TempArticleListResponse {
        total: articles.len(),
        articles,
    }))
}
