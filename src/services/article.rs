//! Article service
//!
//! Listing, preview with a "more" flag, and lookup by id or by slug. Articles
//! without a stored slug are addressable by the slug of their title.

use serde_json::Value;

use crate::db::repositories::Collection;
use crate::models::{Article, ArticlePreview, ArticleSummary};
use crate::services::error::{ContentError, ContentResult};
use crate::services::slug::generate_slug;

pub struct ArticleService {
    articles: Collection<Article>,
}

impl ArticleService {
    pub fn new(articles: Collection<Article>) -> Self {
        Self { articles }
    }

    pub async fn list(&self) -> ContentResult<Vec<ArticleSummary>> {
        let articles = self.articles.list(None).await?;
        Ok(articles.iter().map(summarize).collect())
    }

    /// First `limit` articles. One extra is fetched to know whether more exist.
    pub async fn preview(&self, limit: usize) -> ContentResult<ArticlePreview> {
        let mut articles = self.articles.list(Some(limit.saturating_add(1))).await?;
        let has_more = articles.len() > limit;
        articles.truncate(limit);
        Ok(ArticlePreview {
            articles: articles.iter().map(summarize).collect(),
            has_more,
        })
    }

    pub async fn get(&self, id: &str) -> ContentResult<Article> {
        let article = self
            .articles
            .get(id)
            .await?
            .ok_or_else(|| ContentError::not_found(format!("Article '{}'", id)))?;
        Ok(with_slug(article))
    }

    /// Stored slug first, then the slug derived from each title.
    pub async fn get_by_slug(&self, slug: &str) -> ContentResult<Article> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(ContentError::validation("Slug cannot be empty"));
        }

        let stored = self
            .articles
            .find_by("slug", Value::String(slug.to_string()))
            .await?;
        if let Some(article) = stored.into_iter().next() {
            return Ok(article);
        }

        tracing::debug!("No stored slug '{}', scanning titles", slug);
        self.articles
            .list(None)
            .await?
            .into_iter()
            .find(|a| generate_slug(&a.title) == slug)
            .map(with_slug)
            .ok_or_else(|| ContentError::not_found(format!("Article '{}'", slug)))
    }
}

fn with_slug(mut article: Article) -> Article {
    if article.slug.as_deref().map_or(true, str::is_empty) {
        article.slug = Some(generate_slug(&article.title));
    }
    article
}

fn summarize(article: &Article) -> ArticleSummary {
    let slug = match article.slug.as_deref() {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => generate_slug(&article.title),
    };
    ArticleSummary {
        id: article.id.clone(),
        title: article.title.clone(),
        author: article.author.clone(),
        publish_date: article.publish_date.clone(),
        image: article.image.clone(),
        excerpt: article.excerpt.clone(),
        slug,
    }
}
