//! Dashboard home: tip of the day, latest articles and public courses

use std::sync::Arc;

use serde::Serialize;

use crate::models::{ArticlePreview, Course, Tip};
use crate::services::article::ArticleService;
use crate::services::course::CourseService;
use crate::services::error::ContentResult;
use crate::services::newsletter::NewsletterService;

/// Articles shown on the home screen
pub const HOME_ARTICLE_COUNT: usize = 4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardHome {
    pub tip: Option<Tip>,
    pub articles: ArticlePreview,
    pub courses: Vec<Course>,
}

pub struct DashboardService {
    articles: Arc<ArticleService>,
    courses: Arc<CourseService>,
    newsletter: Arc<NewsletterService>,
}

impl DashboardService {
    pub fn new(
        articles: Arc<ArticleService>,
        courses: Arc<CourseService>,
        newsletter: Arc<NewsletterService>,
    ) -> Self {
        Self {
            articles,
            courses,
            newsletter,
        }
    }

    pub async fn home(&self) -> ContentResult<DashboardHome> {
        let (tip, articles, courses) = tokio::try_join!(
            self.newsletter.tip_of_the_day(),
            self.articles.preview(HOME_ARTICLE_COUNT),
            self.courses.list_public(),
        )?;
        Ok(DashboardHome {
            tip,
            articles,
            courses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::Collection;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use crate::models::Article;

    #[tokio::test]
    async fn test_home() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let store = SqlxDocumentStore::boxed(pool);

        let articles: Collection<Article> = Collection::new(store.clone());
        for i in 0..6 {
            articles
                .insert(&Article {
                    id: String::new(),
                    title: format!("Lesson {}", i),
                    author: "FinMaster".to_string(),
                    publish_date: None,
                    image: None,
                    excerpt: String::new(),
                    content: String::new(),
                    slug: None,
                })
                .await
                .unwrap();
        }

        let service = DashboardService::new(
            Arc::new(ArticleService::new(articles)),
            Arc::new(CourseService::new(Collection::new(store.clone()))),
            Arc::new(NewsletterService::new(
                Collection::new(store.clone()),
                Collection::new(store),
            )),
        );

        let home = service.home().await.unwrap();
        assert!(home.tip.is_none());
        assert_eq!(home.articles.articles.len(), HOME_ARTICLE_COUNT);
        assert!(home.articles.has_more);
        assert!(home.courses.is_empty());
    }
}
