//! Article management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use litkeep_common::{
    auth::AuthContext,
    authors::AuthorInput,
    db::models::Article,
    db::Repository,
    errors::{AppError, Result},
    services::{ArticleFields, ArticleService, ArticleUpdate},
};

/// Request to save a new article
#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,

    #[validate(length(min = 1, max = 2000))]
    pub url: String,

    pub doi: Option<String>,

    pub journal: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub price: Option<f64>,

    pub purchased_at: Option<chrono::DateTime<chrono::Utc>>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub file_key: Option<String>,

    /// Author list or free text; normalized server-side
    #[serde(default)]
    pub authors: AuthorInput,
}

/// Partial update request. Omitted `authors` leaves the author relation
/// untouched; an empty list clears it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 1000))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 2000))]
    pub url: Option<String>,

    pub doi: Option<String>,

    pub journal: Option<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub price: Option<f64>,

    pub purchased_at: Option<chrono::DateTime<chrono::Utc>>,

    pub tags: Option<Vec<String>>,

    pub file_key: Option<String>,

    pub authors: Option<AuthorInput>,
}

/// Article representation returned by the API
#[derive(Serialize)]
pub struct ArticleResponse {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub doi: Option<String>,
    pub authors: String,
    pub journal: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub price: Option<f64>,
    pub purchased_at: Option<String>,
    pub tags: serde_json::Value,
    pub file_key: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_authors: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleResponse>,
    pub total: usize,
}

impl ArticleResponse {
    fn from_model(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            url: article.url,
            doi: article.doi,
            authors: article.authors_display,
            journal: article.journal,
            abstract_text: article.abstract_text,
            price: article.price,
            purchased_at: article.purchased_at.map(|dt| dt.to_rfc3339()),
            tags: article.tags,
            file_key: article.file_key,
            created_at: article.created_at.to_rfc3339(),
            linked_authors: None,
        }
    }
}

fn article_service(state: &AppState) -> ArticleService {
    ArticleService::new(
        Repository::new(state.db.clone()),
        state.config.quota.free_plan_article_limit,
    )
}

fn validate<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

impl CreateArticleRequest {
    pub(crate) fn into_parts(self) -> (ArticleFields, AuthorInput) {
        (
            ArticleFields {
                title: self.title,
                url: self.url,
                doi: self.doi,
                journal: self.journal,
                abstract_text: self.abstract_text,
                price: self.price,
                purchased_at: self.purchased_at.map(|dt| dt.fixed_offset()),
                tags: self.tags,
                file_key: self.file_key,
            },
            self.authors,
        )
    }
}

/// Save a new article for the authenticated user
pub async fn create_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<ArticleResponse>)> {
    validate(&request)?;

    let (fields, authors) = request.into_parts();
    let article = article_service(&state)
        .create(auth.user_id, fields, authors)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ArticleResponse::from_model(article)),
    ))
}

/// List the authenticated user's articles
pub async fn list_articles(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ArticleListResponse>> {
    let articles = article_service(&state).list(auth.user_id).await?;

    let articles: Vec<ArticleResponse> = articles
        .into_iter()
        .map(ArticleResponse::from_model)
        .collect();

    Ok(Json(ArticleListResponse {
        total: articles.len(),
        articles,
    }))
}

/// Get one article with its linked author names
pub async fn get_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
) -> Result<Json<ArticleResponse>> {
    let (article, authors) = article_service(&state).get(auth.user_id, article_id).await?;

    let mut response = ArticleResponse::from_model(article);
    response.linked_authors = Some(authors.into_iter().map(|a| a.name).collect());

    Ok(Json(response))
}

/// Apply a partial update to an article
pub async fn update_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
    Json(request): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>> {
    validate(&request)?;

    let update = ArticleUpdate {
        title: request.title,
        url: request.url,
        doi: request.doi,
        journal: request.journal,
        abstract_text: request.abstract_text,
        price: request.price,
        purchased_at: request.purchased_at.map(|dt| dt.fixed_offset()),
        tags: request.tags,
        file_key: request.file_key,
        authors: request.authors,
    };

    let article = article_service(&state)
        .update(auth.user_id, article_id, update)
        .await?;

    Ok(Json(ArticleResponse::from_model(article)))
}

/// Delete an article
pub async fn delete_article(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(article_id): Path<Uuid>,
) -> Result<StatusCode> {
    article_service(&state)
        .delete(auth.user_id, article_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authors_accept_list_and_text() {
        let from_list: CreateArticleRequest = serde_json::from_str(
            r#"{"title":"T","url":"http://x","authors":["Jane Doe","John Smith"]}"#,
        )
        .unwrap();
        assert_eq!(
            from_list.authors,
            AuthorInput::List(vec!["Jane Doe".into(), "John Smith".into()])
        );

        let from_text: CreateArticleRequest =
            serde_json::from_str(r#"{"title":"T","url":"http://x","authors":"Jane Doe and John Smith"}"#)
                .unwrap();
        assert_eq!(
            from_text.authors,
            AuthorInput::Text("Jane Doe and John Smith".into())
        );
    }

    #[test]
    fn test_update_distinguishes_omitted_and_empty_authors() {
        let omitted: UpdateArticleRequest =
            serde_json::from_str(r#"{"title":"New"}"#).unwrap();
        assert!(omitted.authors.is_none());

        let empty: UpdateArticleRequest =
            serde_json::from_str(r#"{"title":"New","authors":[]}"#).unwrap();
        assert_eq!(empty.authors, Some(AuthorInput::List(vec![])));
    }

    #[test]
    fn test_create_request_validation() {
        let request: CreateArticleRequest =
            serde_json::from_str(r#"{"title":"","url":"http://x"}"#).unwrap();
        assert!(request.validate().is_err());

        let request: CreateArticleRequest =
            serde_json::from_str(r#"{"title":"T","url":"http://x"}"#).unwrap();
        assert!(request.validate().is_ok());
    }
}
