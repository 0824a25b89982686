//! Shop API endpoints
//!
//! - GET /api/v1/shop[?category=ID&search=TEXT]

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState};
use crate::models::ShopCatalog;
use crate::services::ShopFilter;

pub fn routes() -> Router<AppState> {
    Router::new().route("/shop", get(catalog))
}

async fn catalog(
    State(state): State<AppState>,
    Query(filter): Query<ShopFilter>,
) -> Result<Json<ShopCatalog>, ApiError> {
    Ok(Json(state.shop.catalog(&filter).await?))
}
