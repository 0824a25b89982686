//! Course reviews: listing with rating summary, and one review per user

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::repositories::Collection;
use crate::db::FieldUpdate;
use crate::models::{Course, CourseReviews, RatingSummary, Review, MAX_RATING, MIN_RATING};
use crate::services::error::{ContentError, ContentResult};

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// The signed-in user writing a review
#[derive(Debug, Clone)]
pub struct Reviewer {
    pub id: String,
    pub name: Option<String>,
    pub photo: Option<String>,
}

pub struct ReviewService {
    reviews: Collection<Review>,
    courses: Collection<Course>,
}

impl ReviewService {
    pub fn new(reviews: Collection<Review>, courses: Collection<Course>) -> Self {
        Self { reviews, courses }
    }

    /// All reviews of a course with their summary. The viewer's own review,
    /// if any, is reported separately as well.
    pub async fn course_reviews(&self, course_id: &str, viewer_id: &str) -> ContentResult<CourseReviews> {
        let reviews = self.for_course(course_id).await?;
        let summary = RatingSummary::from_ratings(reviews.iter().map(|r| r.rating));
        let own_review = reviews.iter().find(|r| r.user_id == viewer_id).cloned();
        Ok(CourseReviews {
            summary,
            reviews,
            own_review,
        })
    }

    /// Create the reviewer's review of a course, or update it if one exists.
    pub async fn upsert(
        &self,
        course_id: &str,
        reviewer: &Reviewer,
        input: ReviewInput,
    ) -> ContentResult<Review> {
        if input.rating < MIN_RATING {
            return Err(ContentError::validation("Please select a rating"));
        }
        if input.rating > MAX_RATING {
            return Err(ContentError::validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }
        if self.courses.get(course_id).await?.is_none() {
            return Err(ContentError::not_found(format!("Course '{}'", course_id)));
        }

        let now = Utc::now().to_rfc3339();
        let comment = input.comment.trim().to_string();
        let existing = self
            .for_course(course_id)
            .await?
            .into_iter()
            .find(|r| r.user_id == reviewer.id);

        if let Some(existing) = existing {
            let updated = self
                .reviews
                .update(
                    &existing.id,
                    &[
                        FieldUpdate::set("rating", json!(input.rating)),
                        FieldUpdate::set("comment", json!(comment)),
                        FieldUpdate::set("updatedAt", json!(now)),
                    ],
                )
                .await?
                .ok_or_else(|| ContentError::not_found(format!("Review '{}'", existing.id)))?;
            return Ok(updated);
        }

        let review = Review {
            id: String::new(),
            course_id: course_id.to_string(),
            user_id: reviewer.id.clone(),
            user_name: reviewer.name.clone(),
            user_photo: reviewer.photo.clone(),
            rating: input.rating,
            comment,
            created_at: Some(now),
            updated_at: None,
        };
        Ok(self.reviews.insert(&review).await?)
    }

    async fn for_course(&self, course_id: &str) -> ContentResult<Vec<Review>> {
        Ok(self
            .reviews
            .find_by("courseId", Value::String(course_id.to_string()))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use crate::models::Visibility;

    async fn setup() -> (ReviewService, String) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        let store = SqlxDocumentStore::boxed(pool);
        let courses: Collection<Course> = Collection::new(store.clone());

        let course = courses
            .insert(&Course {
                id: String::new(),
                name: Some("Budgeting".to_string()),
                title: None,
                image_url: None,
                description: String::new(),
                instructor: None,
                status: Visibility::Public,
                videos: vec![],
            })
            .await
            .unwrap();

        (ReviewService::new(Collection::new(store), courses), course.id)
    }

    fn reviewer(id: &str) -> Reviewer {
        Reviewer {
            id: id.to_string(),
            name: Some(id.to_uppercase()),
            photo: None,
        }
    }

    fn input(rating: u8, comment: &str) -> ReviewInput {
        ReviewInput {
            rating,
            comment: comment.to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_reviews() {
        let (service, course_id) = setup().await;
        let reviews = service.course_reviews(&course_id, "u1").await.unwrap();
        assert_eq!(reviews.summary.average, None);
        assert_eq!(reviews.summary.total, 0);
        assert!(reviews.own_review.is_none());
    }

    #[tokio::test]
    async fn test_summary_and_own_review() {
        let (service, course_id) = setup().await;
        service.upsert(&course_id, &reviewer("u1"), input(5, "Great")).await.unwrap();
        service.upsert(&course_id, &reviewer("u2"), input(4, "Good")).await.unwrap();
        service.upsert(&course_id, &reviewer("u3"), input(4, "")).await.unwrap();

        let reviews = service.course_reviews(&course_id, "u2").await.unwrap();
        assert_eq!(reviews.summary.total, 3);
        assert_eq!(reviews.summary.average, Some(4.3));
        assert_eq!(reviews.own_review.unwrap().comment, "Good");
    }

    #[tokio::test]
    async fn test_upsert_updates_existing() {
        let (service, course_id) = setup().await;
        let first = service.upsert(&course_id, &reviewer("u1"), input(2, "Meh")).await.unwrap();
        let second = service
            .upsert(&course_id, &reviewer("u1"), input(5, " Changed my mind "))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.rating, 5);
        assert_eq!(second.comment, "Changed my mind");
        assert!(second.updated_at.is_some());
        assert_eq!(service.course_reviews(&course_id, "u1").await.unwrap().reviews.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_validation() {
        let (service, course_id) = setup().await;
        let err = service
            .upsert(&course_id, &reviewer("u1"), input(0, "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Please select a rating");
        assert!(matches!(
            service.upsert(&course_id, &reviewer("u1"), input(6, "x")).await,
            Err(ContentError::Validation(_))
        ));
        assert!(matches!(
            service.upsert("missing", &reviewer("u1"), input(3, "x")).await,
            Err(ContentError::NotFound(_))
        ));
    }
}
