//! Database repositories
//!
//! Relational repositories (accounts, sessions, tokens, login log) follow the
//! trait + `Sqlx*` implementation pattern. Content models go through the typed
//! [`Collection`] wrapper over the document store.

pub mod account;
pub mod auth_token;
pub mod collection;
pub mod login_log;
pub mod session;

pub use account::{AccountRepository, SqlxAccountRepository};
pub use auth_token::{AuthTokenRepository, SqlxAuthTokenRepository};
pub use collection::{Collected, Collection, CONTENT_COLLECTIONS};
pub use login_log::{LoginLogEntry, LoginLogRepository, SqlxLoginLogRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
