//! Admin content API endpoints (admin role required)
//!
//! - POST /api/v1/admin/collections/{collection} - Create a document
//! - PUT /api/v1/admin/collections/{collection}/{id} - Create or replace a document
//! - DELETE /api/v1/admin/collections/{collection}/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use serde_json::Value;

use crate::api::middleware::{ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/collections/{collection}", post(create_document))
        .route(
            "/admin/collections/{collection}/{id}",
            put(replace_document).delete(delete_document),
        )
}

async fn create_document(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let doc = state.admin.create(&collection, body).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn replace_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.admin.replace(&collection, &id, body).await?))
}

async fn delete_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.admin.delete(&collection, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
