//! Article model

use serde::{Deserialize, Serialize};

/// Article document (`articles` collection).
///
/// `content` is trusted HTML authored by administrators. `slug` is optional
/// in storage; lookups derive one from the title when it's missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Card-sized view of an article for list pages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub publish_date: Option<String>,
    pub image: Option<String>,
    pub excerpt: String,
    pub slug: String,
}

/// First N articles plus whether more exist
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePreview {
    pub articles: Vec<ArticleSummary>,
    pub has_more: bool,
}
