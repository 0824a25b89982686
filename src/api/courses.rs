//! Course and review API endpoints
//!
//! - GET /api/v1/courses - Public courses
//! - GET /api/v1/courses/{id}
//! - GET /api/v1/courses/{id}/learn[?video=ID]
//! - GET /api/v1/courses/{id}/reviews
//! - PUT /api/v1/courses/{id}/reviews - Create or update own review

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Course, CourseLearnView, CourseReviews, Review};
use crate::services::{ReviewInput, Reviewer};

#[derive(Debug, Deserialize)]
pub struct LearnQuery {
    pub video: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/learn", get(learn))
        .route("/courses/{id}/reviews", get(list_reviews).put(upsert_review))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(state.courses.list_public().await?))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(state.courses.get(&id).await?))
}

async fn learn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LearnQuery>,
) -> Result<Json<CourseLearnView>, ApiError> {
    let video = query.video.as_deref().filter(|v| !v.is_empty());
    Ok(Json(state.courses.learn(&id, video).await?))
}

async fn list_reviews(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<CourseReviews>, ApiError> {
    if !state.courses.exists(&id).await? {
        return Err(ApiError::not_found(format!("Course '{}' not found", id)));
    }
    Ok(Json(state.reviews.course_reviews(&id, &user.0.id).await?))
}

async fn upsert_review(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(body): Json<ReviewInput>,
) -> Result<Json<Review>, ApiError> {
    let account = user.0;
    let reviewer = Reviewer {
        id: account.id,
        name: Some(account.display_name),
        photo: account.photo_url,
    };
    Ok(Json(state.reviews.upsert(&id, &reviewer, body).await?))
}
