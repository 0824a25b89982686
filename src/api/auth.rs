//! Authentication API endpoints
//!
//! - POST /api/v1/auth/register - Sign up (first account becomes admin)
//! - POST /api/v1/auth/login - Sign in
//! - POST /api/v1/auth/logout - Sign out
//! - GET /api/v1/auth/me - Current account
//! - POST /api/v1/auth/verify-email - Confirm email with a mailed token
//! - POST /api/v1/auth/password-reset - Request a reset link
//! - POST /api/v1/auth/password-reset/confirm - Set a new password

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{
    cleared_session_cookie, client_ip, extract_session_token, session_cookie, ApiError, AppState,
    AuthenticatedUser,
};
use crate::models::Account;
use crate::services::{RegisterInput, SignInInput, SignedIn};

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: Account,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmRequest {
    pub token: String,
    pub password: String,
}

/// Routes reachable without a session
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/password-reset", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(confirm_password_reset))
}

/// Routes behind the auth middleware
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn signed_in_response(
    state: &AppState,
    status: StatusCode,
    signed: SignedIn,
) -> Result<impl IntoResponse, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&signed.session.id, state.session_days)?,
    );
    Ok((
        status,
        headers,
        Json(AuthResponse {
            user: signed.account,
            token: signed.session.id,
        }),
    ))
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<impl IntoResponse, ApiError> {
    let signed = state.accounts.register(body).await?;
    signed_in_response(&state, StatusCode::CREATED, signed)
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SignInInput>,
) -> Result<impl IntoResponse, ApiError> {
    let signed = state.accounts.sign_in(body, client_ip(&headers)).await?;
    signed_in_response(&state, StatusCode::OK, signed)
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        state.accounts.sign_out(&token).await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cleared_session_cookie())],
    ))
}

/// GET /api/v1/auth/me
async fn me(user: AuthenticatedUser) -> Json<Account> {
    Json(user.0)
}

/// POST /api/v1/auth/verify-email
async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(state.accounts.verify_email(&body.token).await?))
}

/// POST /api/v1/auth/password-reset
///
/// Always 202 for a well-formed request, whether or not the email is known.
async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts.request_password_reset(&body.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "message": "If an account exists for this email, a reset link has been sent"
        })),
    ))
}

/// POST /api/v1/auth/password-reset/confirm
async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetConfirmRequest>,
) -> Result<StatusCode, ApiError> {
    state.accounts.reset_password(&body.token, &body.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
