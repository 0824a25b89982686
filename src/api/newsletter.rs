//! Newsletter API endpoints
//!
//! - POST /api/v1/newsletter - Subscribe (no session required)

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Subscription;
use crate::services::SubscribeInput;

pub fn routes() -> Router<AppState> {
    Router::new().route("/newsletter", post(subscribe))
}

async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeInput>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let subscription = state.newsletter.subscribe(body).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}
