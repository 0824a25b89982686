//! Dashboard API endpoints
//!
//! - GET /api/v1/dashboard - Tip of the day, latest articles and public courses

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::services::DashboardHome;

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(home))
}

async fn home(State(state): State<AppState>) -> Result<Json<DashboardHome>, ApiError> {
    Ok(Json(state.dashboard.home().await?))
}
