//! Account service
//!
//! Sign-up, sign-in/out, session validation, email verification and password
//! reset. The first account ever registered becomes the admin. Every account
//! has a profile document in `users` under the same id.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::db::repositories::{AccountRepository, AuthTokenRepository, Collection, SessionRepository};
use crate::db::FieldUpdate;
use crate::models::{Account, AccountRole, AuthToken, Session, SocialLinks, TokenPurpose, UserProfile};
use crate::services::auth_events::{AuthEvent, AuthEvents};
use crate::services::credentials::{generate_token, hash_password, hash_token, verify_password};
use crate::services::mailer::Mailer;
use crate::services::rate_limiter::LoginRateLimiter;
use crate::services::validation::{validate_email, validate_name, validate_password};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Too many sign-in attempts, try again later")]
    RateLimited,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Signed-in account and its new session
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub account: Account,
    pub session: Session,
}

pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionRepository>,
    tokens: Arc<dyn AuthTokenRepository>,
    profiles: Collection<UserProfile>,
    mailer: Arc<Mailer>,
    events: Arc<AuthEvents>,
    limiter: Arc<LoginRateLimiter>,
    config: AuthConfig,
}

impl AccountService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionRepository>,
        tokens: Arc<dyn AuthTokenRepository>,
        profiles: Collection<UserProfile>,
        mailer: Arc<Mailer>,
        events: Arc<AuthEvents>,
        limiter: Arc<LoginRateLimiter>,
        config: AuthConfig,
    ) -> Self {
        Self {
            accounts,
            sessions,
            tokens,
            profiles,
            mailer,
            events,
            limiter,
            config,
        }
    }

    /// Create an account and its profile document, mail a verification link
    /// and sign the new account in.
    pub async fn register(&self, input: RegisterInput) -> Result<SignedIn, AccountServiceError> {
        let name = validate_name(&input.name).map_err(AccountServiceError::Validation)?;
        let email = validate_email(&input.email).map_err(AccountServiceError::Validation)?;
        validate_password(&input.password).map_err(AccountServiceError::Validation)?;

        if self.accounts.get_by_email(&email).await?.is_some() {
            return Err(AccountServiceError::EmailTaken);
        }

        let role = if self.accounts.count().await? == 0 {
            AccountRole::Admin
        } else {
            AccountRole::Member
        };

        let password_hash = hash_password(&input.password)?;
        let account = self
            .accounts
            .create(&Account::new(email, password_hash, name, role))
            .await
            .map_err(|e| {
                // Lost a race with a concurrent sign-up for the same email
                if format!("{:#}", e).to_lowercase().contains("unique") {
                    AccountServiceError::EmailTaken
                } else {
                    AccountServiceError::Internal(e)
                }
            })?;

        let profile = UserProfile {
            id: account.id.clone(),
            display_name: account.display_name.clone(),
            email: account.email.clone(),
            photo_url: None,
            social_links: SocialLinks::default(),
            created_at: Some(account.created_at.to_rfc3339()),
        };
        self.profiles
            .set(&account.id, &profile)
            .await
            .context("Failed to create profile document")?;

        if let Err(e) = self.send_verification(&account).await {
            tracing::warn!("Failed to send verification email to {}: {:#}", account.email, e);
        }

        let session = self.create_session(&account.id).await?;
        tracing::info!("Registered account {} ({})", account.id, account.role);
        self.events.publish(AuthEvent::SignedUp {
            account_id: account.id.clone(),
            email: account.email.clone(),
        });

        Ok(SignedIn { account, session })
    }

    /// Check credentials and open a session. Failures are throttled per email
    /// and per client IP.
    pub async fn sign_in(
        &self,
        input: SignInInput,
        ip: Option<String>,
    ) -> Result<SignedIn, AccountServiceError> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || input.password.is_empty() {
            return Err(AccountServiceError::Validation(
                "Please enter your email and password".to_string(),
            ));
        }

        if let Some(ip) = &ip {
            if !self.limiter.admit_ip(ip).await {
                return Err(AccountServiceError::RateLimited);
            }
        }
        if self.limiter.is_email_limited(&email).await {
            self.publish_failure(&email, &ip, "rate_limited");
            return Err(AccountServiceError::RateLimited);
        }

        let account = match self.accounts.get_by_email(&email).await? {
            Some(account) => account,
            None => {
                self.limiter.record_failure(&email).await;
                self.publish_failure(&email, &ip, "unknown_email");
                return Err(AccountServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&input.password, &account.password_hash)? {
            self.limiter.record_failure(&email).await;
            self.publish_failure(&email, &ip, "invalid_password");
            return Err(AccountServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        self.limiter.clear_email(&email).await;
        let session = self.create_session(&account.id).await?;
        self.events.publish(AuthEvent::SignedIn {
            account_id: account.id.clone(),
            email: account.email.clone(),
            ip,
        });

        Ok(SignedIn { account, session })
    }

    pub async fn sign_out(&self, session_id: &str) -> Result<(), AccountServiceError> {
        if let Some(session) = self.sessions.get_by_id(session_id).await? {
            self.sessions.delete(session_id).await?;
            self.events.publish(AuthEvent::SignedOut {
                account_id: session.account_id,
            });
        }
        Ok(())
    }

    /// Resolve a session token to its account. Expired sessions are deleted.
    pub async fn validate_session(&self, session_id: &str) -> Result<Account, AccountServiceError> {
        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .ok_or(AccountServiceError::SessionNotFound)?;

        if session.is_expired() {
            self.sessions.delete(session_id).await?;
            return Err(AccountServiceError::SessionExpired);
        }

        self.accounts
            .get_by_id(&session.account_id)
            .await?
            .ok_or(AccountServiceError::SessionNotFound)
    }

    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AccountServiceError> {
        Ok(self.accounts.get_by_id(id).await?)
    }

    /// Mail a reset link if the email belongs to an account. Unknown emails
    /// succeed silently.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AccountServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AccountServiceError::Validation(
                "Please enter your email address".to_string(),
            ));
        }

        let Some(account) = self.accounts.get_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        self.tokens
            .delete_for_account(&account.id, TokenPurpose::ResetPassword)
            .await?;
        let token = self
            .issue_token(
                &account.id,
                TokenPurpose::ResetPassword,
                Duration::minutes(self.config.reset_token_minutes),
            )
            .await?;

        if let Err(e) = self
            .mailer
            .send_password_reset(&account.email, &token, self.config.reset_token_minutes)
            .await
        {
            tracing::warn!("Failed to send password reset email: {:#}", e);
        }
        Ok(())
    }

    /// Set a new password with a reset token. Every session of the account is
    /// ended.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountServiceError> {
        validate_password(new_password).map_err(AccountServiceError::Validation)?;
        let account_id = self.redeem_token(token, TokenPurpose::ResetPassword).await?;

        let password_hash = hash_password(new_password)?;
        self.accounts.update_password(&account_id, &password_hash).await?;
        let ended = self.sessions.delete_by_account(&account_id).await?;
        tracing::info!("Password reset for {}, ended {} sessions", account_id, ended);

        self.events.publish(AuthEvent::PasswordReset { account_id });
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<Account, AccountServiceError> {
        let account_id = self.redeem_token(token, TokenPurpose::VerifyEmail).await?;
        self.accounts.mark_email_verified(&account_id).await?;
        self.events.publish(AuthEvent::EmailVerified {
            account_id: account_id.clone(),
        });

        self.accounts
            .get_by_id(&account_id)
            .await?
            .ok_or(AccountServiceError::InvalidToken)
    }

    /// Point the account and its profile document at a new photo.
    pub async fn update_photo(&self, account_id: &str, photo_url: &str) -> Result<(), AccountServiceError> {
        self.accounts.update_photo(account_id, photo_url).await?;
        let updated = self
            .profiles
            .update(account_id, &[FieldUpdate::set("photoURL", photo_url.into())])
            .await?;
        if updated.is_none() {
            tracing::warn!("Account {} has no profile document", account_id);
        }
        Ok(())
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AccountServiceError> {
        Ok(self.sessions.delete_expired().await?)
    }

    async fn create_session(&self, account_id: &str) -> anyhow::Result<Session> {
        let now = Utc::now();
        let session = Session {
            id: generate_token(),
            account_id: account_id.to_string(),
            expires_at: now + Duration::days(self.config.session_days),
            created_at: now,
        };
        self.sessions.create(&session).await
    }

    async fn send_verification(&self, account: &Account) -> anyhow::Result<()> {
        let token = self
            .issue_token(
                &account.id,
                TokenPurpose::VerifyEmail,
                Duration::hours(self.config.verify_token_hours),
            )
            .await?;
        self.mailer
            .send_verification(&account.email, &account.display_name, &token)
            .await
    }

    /// Store the hash of a fresh token; returns the plain token for mailing.
    async fn issue_token(
        &self,
        account_id: &str,
        purpose: TokenPurpose,
        lifetime: Duration,
    ) -> anyhow::Result<String> {
        let token = generate_token();
        self.tokens
            .create(&AuthToken {
                token_hash: hash_token(&token),
                account_id: account_id.to_string(),
                purpose,
                expires_at: Utc::now() + lifetime,
            })
            .await?;
        Ok(token)
    }

    async fn redeem_token(&self, token: &str, purpose: TokenPurpose) -> Result<String, AccountServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AccountServiceError::InvalidToken);
        }
        match self.tokens.take(&hash_token(token), purpose).await? {
            Some(stored) if !stored.is_expired() => Ok(stored.account_id),
            _ => Err(AccountServiceError::InvalidToken),
        }
    }

    fn publish_failure(&self, email: &str, ip: &Option<String>, reason: &str) {
        self.events.publish(AuthEvent::SignInFailed {
            email: email.to_string(),
            ip: ip.clone(),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxAccountRepository, SqlxAuthTokenRepository, SqlxSessionRepository};
    use crate::db::{create_test_pool, migrations, SqlxDocumentStore};
    use crate::services::mailer::OutgoingMail;
    use std::sync::Mutex;

    struct Fixture {
        service: AccountService,
        outbox: Arc<Mutex<Vec<OutgoingMail>>>,
        profiles: Collection<UserProfile>,
        events: Arc<AuthEvents>,
        sessions: Arc<dyn SessionRepository>,
        tokens: Arc<dyn AuthTokenRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool).await.expect("Failed to run migrations");

        let profiles = Collection::new(SqlxDocumentStore::boxed(pool.clone()));
        let (mailer, outbox) = Mailer::capturing("http://localhost:8080");
        let events = Arc::new(AuthEvents::new());
        let sessions = SqlxSessionRepository::boxed(pool.clone());
        let tokens = SqlxAuthTokenRepository::boxed(pool.clone());
        let service = AccountService::new(
            SqlxAccountRepository::boxed(pool),
            sessions.clone(),
            tokens.clone(),
            profiles.clone(),
            Arc::new(mailer),
            events.clone(),
            Arc::new(LoginRateLimiter::new()),
            AuthConfig::default(),
        );
        Fixture {
            service,
            outbox,
            profiles,
            events,
            sessions,
            tokens,
        }
    }

    fn register_input(email: &str) -> RegisterInput {
        RegisterInput {
            name: "Ana".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
        }
    }

    fn sign_in_input(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Pull the token out of the last mailed link
    fn last_token(outbox: &Arc<Mutex<Vec<OutgoingMail>>>) -> String {
        let sent = outbox.lock().unwrap();
        let body = &sent.last().expect("no mail sent").body;
        let start = body.find("token=").unwrap() + "token=".len();
        body[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect()
    }

    #[tokio::test]
    async fn test_first_account_is_admin() {
        let f = setup().await;
        let first = f.service.register(register_input("a@example.com")).await.unwrap();
        let second = f.service.register(register_input("b@example.com")).await.unwrap();
        assert_eq!(first.account.role, AccountRole::Admin);
        assert_eq!(second.account.role, AccountRole::Member);
    }

    #[tokio::test]
    async fn test_register_creates_profile_and_mails_verification() {
        let f = setup().await;
        let mut sub = f.events.subscribe();
        let signed = f.service.register(register_input("Ana@Example.com")).await.unwrap();

        let profile = f.profiles.get(&signed.account.id).await.unwrap().unwrap();
        assert_eq!(profile.display_name, "Ana");
        assert_eq!(profile.email, "ana@example.com");
        assert_eq!(profile.social_links, SocialLinks::default());

        assert_eq!(f.outbox.lock().unwrap().len(), 1);
        assert!(!signed.account.email_verified);
        assert_eq!(sub.next().await.unwrap().name(), "signed_up");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let f = setup().await;
        let mut input = register_input("a@example.com");
        input.password = "123".to_string();
        assert!(matches!(
            f.service.register(input).await,
            Err(AccountServiceError::Validation(_))
        ));

        let mut input = register_input("not-an-email");
        input.name = "Ana".to_string();
        assert!(matches!(
            f.service.register(input).await,
            Err(AccountServiceError::Validation(_))
        ));

        f.service.register(register_input("a@example.com")).await.unwrap();
        assert!(matches!(
            f.service.register(register_input("A@example.com")).await,
            Err(AccountServiceError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let f = setup().await;
        f.service.register(register_input("a@example.com")).await.unwrap();

        let err = f
            .service
            .sign_in(sign_in_input("a@example.com", "wrong-pass"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Invalid email or password");

        let signed = f
            .service
            .sign_in(sign_in_input("A@Example.com", "secret123"), None)
            .await
            .unwrap();
        let account = f.service.validate_session(&signed.session.id).await.unwrap();
        assert_eq!(account.id, signed.account.id);

        f.service.sign_out(&signed.session.id).await.unwrap();
        assert!(matches!(
            f.service.validate_session(&signed.session.id).await,
            Err(AccountServiceError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let f = setup().await;
        assert!(matches!(
            f.service.validate_session(&generate_token()).await,
            Err(AccountServiceError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_sign_in_throttled_after_repeated_failures() {
        let f = setup().await;
        f.service.register(register_input("a@example.com")).await.unwrap();

        for _ in 0..5 {
            let _ = f
                .service
                .sign_in(sign_in_input("a@example.com", "wrong-pass"), None)
                .await;
        }
        assert!(matches!(
            f.service
                .sign_in(sign_in_input("a@example.com", "secret123"), None)
                .await,
            Err(AccountServiceError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_password_reset_ends_sessions_and_token_is_single_use() {
        let f = setup().await;
        let signed = f.service.register(register_input("a@example.com")).await.unwrap();

        f.service.request_password_reset("a@example.com").await.unwrap();
        let token = last_token(&f.outbox);

        f.service.reset_password(&token, "newsecret").await.unwrap();
        assert!(f.service.validate_session(&signed.session.id).await.is_err());
        assert!(matches!(
            f.service.reset_password(&token, "another1").await,
            Err(AccountServiceError::InvalidToken)
        ));

        assert!(f
            .service
            .sign_in(sign_in_input("a@example.com", "newsecret"), None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_password_reset_request_for_unknown_email() {
        let f = setup().await;
        f.service.request_password_reset("ghost@example.com").await.unwrap();
        assert!(f.outbox.lock().unwrap().is_empty());

        let err = f.service.request_password_reset("  ").await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Please enter your email address");
    }

    #[tokio::test]
    async fn test_verify_email() {
        let f = setup().await;
        f.service.register(register_input("a@example.com")).await.unwrap();
        let token = last_token(&f.outbox);

        let account = f.service.verify_email(&token).await.unwrap();
        assert!(account.email_verified);
        assert!(matches!(
            f.service.verify_email(&token).await,
            Err(AccountServiceError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_update_photo_updates_profile() {
        let f = setup().await;
        let signed = f.service.register(register_input("a@example.com")).await.unwrap();
        f.service
            .update_photo(&signed.account.id, "/uploads/profile-pictures/x.png")
            .await
            .unwrap();

        let account = f.service.get_account(&signed.account.id).await.unwrap().unwrap();
        assert_eq!(account.photo_url.as_deref(), Some("/uploads/profile-pictures/x.png"));
        let profile = f.profiles.get(&signed.account.id).await.unwrap().unwrap();
        assert_eq!(profile.photo_url.as_deref(), Some("/uploads/profile-pictures/x.png"));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let f = setup().await;
        let signed = f.service.register(register_input("a@example.com")).await.unwrap();

        let stale = Session {
            id: generate_token(),
            account_id: signed.account.id.clone(),
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::days(8),
        };
        f.sessions.create(&stale).await.unwrap();

        assert!(matches!(
            f.service.validate_session(&stale.id).await,
            Err(AccountServiceError::SessionExpired)
        ));
        assert!(f.sessions.get_by_id(&stale.id).await.unwrap().is_none());
        assert!(matches!(
            f.service.validate_session(&stale.id).await,
            Err(AccountServiceError::SessionNotFound)
        ));

        // The live session from sign-up is unaffected
        assert!(f.service.validate_session(&signed.session.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_tokens_are_invalid() {
        let f = setup().await;
        let signed = f.service.register(register_input("a@example.com")).await.unwrap();

        let reset = generate_token();
        let verify = generate_token();
        for (token, purpose) in [
            (&reset, TokenPurpose::ResetPassword),
            (&verify, TokenPurpose::VerifyEmail),
        ] {
            f.tokens
                .create(&AuthToken {
                    token_hash: hash_token(token),
                    account_id: signed.account.id.clone(),
                    purpose,
                    expires_at: Utc::now() - Duration::minutes(1),
                })
                .await
                .unwrap();
        }

        assert!(matches!(
            f.service.reset_password(&reset, "newsecret1").await,
            Err(AccountServiceError::InvalidToken)
        ));
        assert!(matches!(
            f.service.verify_email(&verify).await,
            Err(AccountServiceError::InvalidToken)
        ));

        // Nothing changed: old password still works, email still unverified
        let again = f
            .service
            .sign_in(sign_in_input("a@example.com", "secret123"), None)
            .await
            .unwrap();
        assert!(!again.account.email_verified);
        assert!(f.service.validate_session(&signed.session.id).await.is_ok());
    }
}
