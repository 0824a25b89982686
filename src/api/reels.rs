//! Reel API endpoints
//!
//! - GET /api/v1/reels - Public reels
//! - GET /api/v1/reels/{id} - Open a reel in the viewer
//! - GET /api/v1/reels/{id}/navigate?direction=next|prev (or ?key=ArrowUp|ArrowDown)
//! - POST /api/v1/reels/{id}/like - Toggle the caller's like
//! - POST /api/v1/reels/{id}/comments
//! - PUT|DELETE /api/v1/reels/{id}/comments/{comment_id} - Own comments only
//! - GET /api/v1/reels/{id}/share

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::Reel;
use crate::services::{Commenter, NavDirection, ReelView, ShareLinks};

#[derive(Debug, Deserialize)]
pub struct NavigateQuery {
    pub direction: Option<String>,
    /// Keyboard key name
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reels", get(list_reels))
        .route("/reels/{id}", get(open_reel))
        .route("/reels/{id}/navigate", get(navigate))
        .route("/reels/{id}/like", post(toggle_like))
        .route("/reels/{id}/comments", post(add_comment))
        .route(
            "/reels/{id}/comments/{comment_id}",
            put(edit_comment).delete(delete_comment),
        )
        .route("/reels/{id}/share", get(share))
}

async fn list_reels(State(state): State<AppState>) -> Result<Json<Vec<Reel>>, ApiError> {
    Ok(Json(state.reels.list_public().await?))
}

async fn open_reel(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ReelView>, ApiError> {
    Ok(Json(state.reels.open(&id, &user.0.id).await?))
}

/// Unrecognised keys leave the viewer on the current reel.
async fn navigate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<NavigateQuery>,
) -> Result<Json<ReelView>, ApiError> {
    let direction = match (&query.direction, &query.key) {
        (Some(direction), _) => Some(NavDirection::parse(direction).ok_or_else(|| {
            ApiError::validation_error("direction must be 'next' or 'prev'")
        })?),
        (None, Some(key)) => NavDirection::from_key(key),
        (None, None) => {
            return Err(ApiError::validation_error("direction or key is required"));
        }
    };

    let view = match direction {
        Some(direction) => state.reels.navigate(&id, direction, &user.0.id).await?,
        None => state.reels.open(&id, &user.0.id).await?,
    };
    Ok(Json(view))
}

async fn toggle_like(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<ReelView>, ApiError> {
    Ok(Json(state.reels.toggle_like(&id, &user.0.id).await?))
}

async fn add_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<ReelView>, ApiError> {
    let account = user.0;
    let author = Commenter {
        id: account.id,
        name: Some(account.display_name),
        photo: account.photo_url,
    };
    Ok(Json(state.reels.add_comment(&id, &author, &body.text).await?))
}

async fn edit_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, comment_id)): Path<(String, String)>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<ReelView>, ApiError> {
    Ok(Json(
        state
            .reels
            .edit_comment(&id, &comment_id, &user.0.id, &body.text)
            .await?,
    ))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<ReelView>, ApiError> {
    Ok(Json(
        state
            .reels
            .delete_comment(&id, &comment_id, &user.0.id)
            .await?,
    ))
}

async fn share(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShareLinks>, ApiError> {
    Ok(Json(state.reels.share_links(&id).await?))
}
