//! API middleware and shared handler types
//!
//! Contains:
//! - Application state wiring
//! - The JSON error type and its mapping from service errors
//! - Authentication (session token from `Authorization: Bearer` or the
//!   `session` cookie) and admin authorization

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    Collection, SqlxAccountRepository, SqlxAuthTokenRepository, SqlxSessionRepository,
};
use crate::db::{DynDatabasePool, SqlxDocumentStore};
use crate::models::Account;
use crate::services::{
    AccountService, AccountServiceError, AdminContentService, ArticleService, AuthEvents,
    ContentError, CourseService, DashboardService, FileStorage, LoginRateLimiter, Mailer,
    NewsletterService, ProfileService, ReelService, ReviewService, ShopService,
};

pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub articles: Arc<ArticleService>,
    pub courses: Arc<CourseService>,
    pub reels: Arc<ReelService>,
    pub reviews: Arc<ReviewService>,
    pub shop: Arc<ShopService>,
    pub profiles: Arc<ProfileService>,
    pub newsletter: Arc<NewsletterService>,
    pub dashboard: Arc<DashboardService>,
    pub admin: Arc<AdminContentService>,
    pub storage: Arc<FileStorage>,
    pub upload_config: Arc<UploadConfig>,
    pub events: Arc<AuthEvents>,
    pub rate_limiter: Arc<LoginRateLimiter>,
    pub session_days: i64,
}

impl AppState {
    /// Wire repositories and services over one database pool.
    pub fn build(pool: DynDatabasePool, config: &Config, mailer: Mailer) -> Self {
        let store = SqlxDocumentStore::boxed(pool.clone());
        let events = Arc::new(AuthEvents::new());
        let rate_limiter = Arc::new(LoginRateLimiter::new());

        let accounts = Arc::new(AccountService::new(
            SqlxAccountRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            SqlxAuthTokenRepository::boxed(pool),
            Collection::new(store.clone()),
            Arc::new(mailer),
            events.clone(),
            rate_limiter.clone(),
            config.auth.clone(),
        ));

        let articles = Arc::new(ArticleService::new(Collection::new(store.clone())));
        let courses = Arc::new(CourseService::new(Collection::new(store.clone())));
        let newsletter = Arc::new(NewsletterService::new(
            Collection::new(store.clone()),
            Collection::new(store.clone()),
        ));
        let dashboard = Arc::new(DashboardService::new(
            articles.clone(),
            courses.clone(),
            newsletter.clone(),
        ));

        Self {
            accounts,
            articles,
            courses,
            reels: Arc::new(ReelService::new(
                Collection::new(store.clone()),
                &config.server.public_url,
            )),
            reviews: Arc::new(ReviewService::new(
                Collection::new(store.clone()),
                Collection::new(store.clone()),
            )),
            shop: Arc::new(ShopService::new(
                Collection::new(store.clone()),
                Collection::new(store.clone()),
            )),
            profiles: Arc::new(ProfileService::new(Collection::new(store.clone()))),
            newsletter,
            dashboard,
            admin: Arc::new(AdminContentService::new(store)),
            storage: Arc::new(FileStorage::new(config.upload.path.clone())),
            upload_config: Arc::new(config.upload.clone()),
            events,
            rate_limiter,
            session_days: config.auth.session_days,
        }
    }
}

/// Authenticated account extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Account);

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// Logs the cause; clients only see a generic message.
    pub fn internal(error: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", error);
        Self::new("INTERNAL_ERROR", "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" | "AT_BOUNDARY" => StatusCode::CONFLICT,
            "RATE_LIMIT" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            ContentError::Validation(msg) => ApiError::validation_error(msg),
            ContentError::Forbidden(msg) => ApiError::forbidden(msg),
            ContentError::AtBoundary(msg) => ApiError::new("AT_BOUNDARY", msg),
            ContentError::Internal(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

impl From<AccountServiceError> for ApiError {
    fn from(err: AccountServiceError) -> Self {
        match err {
            AccountServiceError::Authentication(msg) => ApiError::unauthorized(msg),
            AccountServiceError::Validation(msg) => ApiError::validation_error(msg),
            AccountServiceError::EmailTaken => ApiError::conflict(err.to_string()),
            AccountServiceError::RateLimited => ApiError::with_details(
                "RATE_LIMIT",
                err.to_string(),
                serde_json::json!({ "retry_after": 60 }),
            ),
            AccountServiceError::SessionExpired | AccountServiceError::SessionNotFound => {
                ApiError::unauthorized("Invalid or expired session")
            }
            AccountServiceError::InvalidToken => ApiError::validation_error(err.to_string()),
            AccountServiceError::Internal(e) => ApiError::internal(format!("{:#}", e)),
        }
    }
}

/// Session token from the bearer header, falling back to the session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Client address, as reported by a reverse proxy
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(ip.to_string());
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `Set-Cookie` value carrying a new session
pub fn session_cookie(token: &str, days: i64) -> Result<HeaderValue, ApiError> {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        days * 24 * 60 * 60
    );
    HeaderValue::from_str(&cookie).map_err(ApiError::internal)
}

/// `Set-Cookie` value that removes the session cookie
pub fn cleared_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let account = state.accounts.validate_session(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(account));
    Ok(next.run(request).await)
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
