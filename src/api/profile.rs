//! Profile API endpoints
//!
//! - GET /api/v1/profile - Own profile
//! - PUT /api/v1/profile/social-links - Replace the four social links
//! - POST /api/v1/profile/photo - Upload a profile picture (multipart field "file" or "photo")

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::config::UploadConfig;
use crate::models::{SocialLinks, UserProfile};

const PICTURE_DIR: &str = "profile-pictures";

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub size: u64,
    pub content_type: String,
}

pub fn routes(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/profile", get(get_profile))
        .route("/profile/social-links", put(update_social_links))
        .route(
            "/profile/photo",
            post(upload_photo).layer(DefaultBodyLimit::max(body_limit)),
        )
}

async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.profiles.get(&user.0).await?))
}

async fn update_social_links(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(links): Json<SocialLinks>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.profiles.update_social_links(&user.0, links).await?))
}

/// Stored as `profile-pictures/<account id>.<ext>`, replacing any earlier
/// picture whatever its extension.
async fn upload_photo(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<PhotoResponse>, ApiError> {
    let config = &state.upload_config;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if !matches!(field.name(), Some("file") | Some("photo")) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        if !config.is_type_allowed(&content_type) {
            return Err(ApiError::validation_error(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type, config.allowed_types
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;
        if data.is_empty() {
            return Err(ApiError::validation_error("Uploaded file is empty"));
        }
        if data.len() as u64 > config.max_file_size {
            return Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                config.max_file_size,
                config.max_file_size / 1024 / 1024
            )));
        }

        let saved = state
            .storage
            .replace(
                PICTURE_DIR,
                &user.0.id,
                UploadConfig::extension_for(&content_type),
                &data,
            )
            .await
            .map_err(ApiError::internal)?;
        // The path is stable per account, the version makes clients refetch.
        let url = format!("{}?v={}", saved, Utc::now().timestamp_millis());
        state.accounts.update_photo(&user.0.id, &url).await?;
        tracing::info!("Account {} uploaded a profile picture", user.0.id);

        return Ok(Json(PhotoResponse {
            photo_url: url,
            size: data.len() as u64,
            content_type,
        }));
    }

    Err(ApiError::validation_error("No file provided"))
}
