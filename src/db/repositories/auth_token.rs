//! Single-use token repository (email verification, password reset)

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AuthToken, TokenPurpose};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait AuthTokenRepository: Send + Sync {
    async fn create(&self, token: &AuthToken) -> Result<()>;

    /// Remove and return the token. A token can be taken at most once.
    async fn take(&self, token_hash: &str, purpose: TokenPurpose) -> Result<Option<AuthToken>>;

    /// Drop outstanding tokens of one purpose for an account
    async fn delete_for_account(&self, account_id: &str, purpose: TokenPurpose) -> Result<u64>;
}

pub struct SqlxAuthTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthTokenRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthTokenRepository for SqlxAuthTokenRepository {
    async fn create(&self, token: &AuthToken) -> Result<()> {
        let sql = "INSERT INTO auth_tokens (token_hash, account_id, purpose, expires_at, created_at) VALUES (?, ?, ?, ?, ?)";
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&token.token_hash)
                .bind(&token.account_id)
                .bind(token.purpose.as_str())
                .bind(token.expires_at)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .map(|_| ()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&token.token_hash)
                .bind(&token.account_id)
                .bind(token.purpose.as_str())
                .bind(token.expires_at)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .map(|_| ()),
        }
        .context("Failed to store auth token")
    }

    async fn take(&self, token_hash: &str, purpose: TokenPurpose) -> Result<Option<AuthToken>> {
        let select = "SELECT account_id, expires_at FROM auth_tokens WHERE token_hash = ? AND purpose = ?";
        let delete = "DELETE FROM auth_tokens WHERE token_hash = ?";

        // The delete decides who wins when the same token is redeemed twice.
        let found: Option<(String, DateTime<Utc>)> = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = self.pool.sqlite()?;
                let row = sqlx::query(select)
                    .bind(token_hash)
                    .bind(purpose.as_str())
                    .fetch_optional(pool)
                    .await?;
                match row {
                    Some(row) => {
                        let deleted = sqlx::query(delete).bind(token_hash).execute(pool).await?;
                        (deleted.rows_affected() == 1)
                            .then(|| (row.get("account_id"), row.get("expires_at")))
                    }
                    None => None,
                }
            }
            DatabaseDriver::Mysql => {
                let pool = self.pool.mysql()?;
                let row = sqlx::query(select)
                    .bind(token_hash)
                    .bind(purpose.as_str())
                    .fetch_optional(pool)
                    .await?;
                match row {
                    Some(row) => {
                        let deleted = sqlx::query(delete).bind(token_hash).execute(pool).await?;
                        (deleted.rows_affected() == 1)
                            .then(|| (row.get("account_id"), row.get("expires_at")))
                    }
                    None => None,
                }
            }
        };

        Ok(found.map(|(account_id, expires_at)| AuthToken {
            token_hash: token_hash.to_string(),
            account_id,
            purpose,
            expires_at,
        }))
    }

    async fn delete_for_account(&self, account_id: &str, purpose: TokenPurpose) -> Result<u64> {
        let sql = "DELETE FROM auth_tokens WHERE account_id = ? AND purpose = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(account_id)
                .bind(purpose.as_str())
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(account_id)
                .bind(purpose.as_str())
                .execute(self.pool.mysql()?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete auth tokens")?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{AccountRepository, SqlxAccountRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Account, AccountRole};
    use chrono::Duration;

    async fn setup() -> (SqlxAuthTokenRepository, String) {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let account = SqlxAccountRepository::new(pool.clone())
            .create(&Account::new(
                "t@example.com".to_string(),
                "hash".to_string(),
                "T".to_string(),
                AccountRole::Member,
            ))
            .await
            .unwrap();
        (SqlxAuthTokenRepository::new(pool), account.id)
    }

    fn token(account_id: &str, hash: &str, purpose: TokenPurpose) -> AuthToken {
        AuthToken {
            token_hash: hash.to_string(),
            account_id: account_id.to_string(),
            purpose,
            expires_at: Utc::now() + Duration::minutes(30),
        }
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let (repo, account_id) = setup().await;
        repo.create(&token(&account_id, "h1", TokenPurpose::ResetPassword)).await.unwrap();

        let taken = repo.take("h1", TokenPurpose::ResetPassword).await.unwrap().unwrap();
        assert_eq!(taken.account_id, account_id);
        assert!(!taken.is_expired());

        assert!(repo.take("h1", TokenPurpose::ResetPassword).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_checks_purpose() {
        let (repo, account_id) = setup().await;
        repo.create(&token(&account_id, "h2", TokenPurpose::VerifyEmail)).await.unwrap();

        assert!(repo.take("h2", TokenPurpose::ResetPassword).await.unwrap().is_none());
        assert!(repo.take("h2", TokenPurpose::VerifyEmail).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_for_account() {
        let (repo, account_id) = setup().await;
        repo.create(&token(&account_id, "a", TokenPurpose::ResetPassword)).await.unwrap();
        repo.create(&token(&account_id, "b", TokenPurpose::ResetPassword)).await.unwrap();
        repo.create(&token(&account_id, "c", TokenPurpose::VerifyEmail)).await.unwrap();

        assert_eq!(repo.delete_for_account(&account_id, TokenPurpose::ResetPassword).await.unwrap(), 2);
        assert!(repo.take("c", TokenPurpose::VerifyEmail).await.unwrap().is_some());
    }
}
