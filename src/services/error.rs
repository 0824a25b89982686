//! Error type shared by the content services

/// Failure of a content operation (articles, courses, reels, reviews, shop,
/// profile, newsletter). Store failures arrive as `Internal`.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller may not touch someone else's data
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Navigation past the first or last item of a bounded list
    #[error("{0}")]
    AtBoundary(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ContentError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type ContentResult<T> = Result<T, ContentError>;
