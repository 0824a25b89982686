//! Article API endpoints
//!
//! - GET /api/v1/articles[?limit=N]
//! - GET /api/v1/articles/{id}
//! - GET /api/v1/articles/slug/{slug}

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Article, ArticlePreview};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/{id}", get(get_article))
        .route("/articles/slug/{slug}", get(get_article_by_slug))
}

/// Without `limit` every article is returned and `hasMore` is false.
async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ArticlePreview>, ApiError> {
    let preview = match query.limit {
        Some(0) => return Err(ApiError::validation_error("limit must be at least 1")),
        Some(limit) => state.articles.preview(limit).await?,
        None => ArticlePreview {
            articles: state.articles.list().await?,
            has_more: false,
        },
    };
    Ok(Json(preview))
}

async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.get(&id).await?))
}

async fn get_article_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.articles.get_by_slug(&slug).await?))
}
