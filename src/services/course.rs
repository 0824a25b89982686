//! Course catalog and the "learn" view

use serde_json::Value;

use crate::db::repositories::Collection;
use crate::models::{Course, CourseLearnView, Visibility};
use crate::services::error::{ContentError, ContentResult};

pub struct CourseService {
    courses: Collection<Course>,
}

impl CourseService {
    pub fn new(courses: Collection<Course>) -> Self {
        Self { courses }
    }

    /// Courses whose status is Public
    pub async fn list_public(&self) -> ContentResult<Vec<Course>> {
        Ok(self
            .courses
            .find_by("status", Value::String(Visibility::Public.to_string()))
            .await?)
    }

    pub async fn get(&self, id: &str) -> ContentResult<Course> {
        self.courses
            .get(id)
            .await?
            .ok_or_else(|| ContentError::not_found(format!("Course '{}'", id)))
    }

    pub async fn exists(&self, id: &str) -> ContentResult<bool> {
        Ok(self.courses.get(id).await?.is_some())
    }

    /// Public videos of a course with one of them selected: the requested
    /// video when given, otherwise the first.
    pub async fn learn(&self, id: &str, video_id: Option<&str>) -> ContentResult<CourseLearnView> {
        let course = self.get(id).await?;
        learn_view(&course, video_id)
    }
}

fn learn_view(course: &Course, video_id: Option<&str>) -> ContentResult<CourseLearnView> {
    let videos: Vec<_> = course.public_videos().cloned().collect();

    let current_video = match video_id {
        Some(wanted) => Some(
            videos
                .iter()
                .find(|v| v.id == wanted)
                .cloned()
                .ok_or_else(|| ContentError::not_found(format!("Video '{}'", wanted)))?,
        ),
        None => videos.first().cloned(),
    };

    Ok(CourseLearnView {
        course_id: course.id.clone(),
        course_name: course.display_name().to_string(),
        public_video_count: videos.len(),
        videos,
        current_video,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use crate::models::Video;

    fn video(id: &str, visibility: Visibility) -> Video {
        Video {
            id: id.to_string(),
            title: format!("Video {}", id),
            video_url: Some(format!("https://cdn.example/{}.mp4", id)),
            thumbnail_url: None,
            duration: Some("5:00".to_string()),
            visibility,
        }
    }

    fn course(name: &str, status: Visibility, videos: Vec<Video>) -> Course {
        Course {
            id: String::new(),
            name: Some(name.to_string()),
            title: None,
            image_url: None,
            description: "<p>About</p>".to_string(),
            instructor: Some("Jo".to_string()),
            status,
            videos,
        }
    }

    async fn setup() -> (CourseService, Collection<Course>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");
        let courses = Collection::new(SqlxDocumentStore::boxed(pool));
        (CourseService::new(courses.clone()), courses)
    }

    #[tokio::test]
    async fn test_list_public_filters_status() {
        let (service, courses) = setup().await;
        courses.insert(&course("Open", Visibility::Public, vec![])).await.unwrap();
        courses
            .insert(&course("Draft", Visibility::Restricted("Draft".to_string()), vec![]))
            .await
            .unwrap();

        let public = service.list_public().await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].display_name(), "Open");
    }

    #[tokio::test]
    async fn test_learn_defaults_to_first_public_video() {
        let (service, courses) = setup().await;
        let stored = courses
            .insert(&course(
                "Investing",
                Visibility::Public,
                vec![
                    video("v1", Visibility::Restricted("Private".to_string())),
                    video("v2", Visibility::Public),
                    video("v3", Visibility::Public),
                ],
            ))
            .await
            .unwrap();

        let view = service.learn(&stored.id, None).await.unwrap();
        assert_eq!(view.public_video_count, 2);
        assert_eq!(view.current_video.unwrap().id, "v2");

        let view = service.learn(&stored.id, Some("v3")).await.unwrap();
        assert_eq!(view.current_video.unwrap().id, "v3");
    }

    #[tokio::test]
    async fn test_learn_rejects_hidden_video() {
        let (service, courses) = setup().await;
        let stored = courses
            .insert(&course(
                "Investing",
                Visibility::Public,
                vec![video("v1", Visibility::Restricted("Private".to_string()))],
            ))
            .await
            .unwrap();

        assert!(matches!(
            service.learn(&stored.id, Some("v1")).await,
            Err(ContentError::NotFound(_))
        ));
        let view = service.learn(&stored.id, None).await.unwrap();
        assert_eq!(view.public_video_count, 0);
        assert!(view.current_video.is_none());
    }

    #[tokio::test]
    async fn test_missing_course() {
        let (service, _) = setup().await;
        assert!(matches!(service.get("nope").await, Err(ContentError::NotFound(_))));
        assert!(!service.exists("nope").await.unwrap());
    }
}
