//! Account repository
//!
//! Credential records for sign-in. Emails are stored lower-cased so lookups
//! are case-insensitive on both backends.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Account, AccountRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, account: &Account) -> Result<Account>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Account>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn count(&self) -> Result<i64>;

    async fn update_photo(&self, id: &str, photo_url: &str) -> Result<()>;

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<()>;

    async fn mark_email_verified(&self, id: &str) -> Result<()>;
}

pub struct SqlxAccountRepository {
    pool: DynDatabasePool,
}

impl SqlxAccountRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AccountRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_ACCOUNT: &str = "SELECT id, email, password_hash, display_name, photo_url, email_verified, role, created_at, updated_at FROM accounts";

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    async fn create(&self, account: &Account) -> Result<Account> {
        let mut account = account.clone();
        account.email = account.email.trim().to_lowercase();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_account_sqlite(self.pool.sqlite()?, &account).await?,
            DatabaseDriver::Mysql => create_account_mysql(self.pool.mysql()?, &account).await?,
        }
        Ok(account)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Account>> {
        let sql = format!("{} WHERE id = ?", SELECT_ACCOUNT);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get account by id")?;
                row.as_ref().map(row_to_account_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get account by id")?;
                row.as_ref().map(row_to_account_mysql).transpose()
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let sql = format!("{} WHERE email = ?", SELECT_ACCOUNT);
        let email = email.trim().to_lowercase();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(&email)
                    .fetch_optional(self.pool.sqlite()?)
                    .await
                    .context("Failed to get account by email")?;
                row.as_ref().map(row_to_account_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(&email)
                    .fetch_optional(self.pool.mysql()?)
                    .await
                    .context("Failed to get account by email")?;
                row.as_ref().map(row_to_account_mysql).transpose()
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) FROM accounts";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query_scalar(sql).fetch_one(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => sqlx::query_scalar(sql).fetch_one(self.pool.mysql()?).await,
        }
        .context("Failed to count accounts")?;
        Ok(count)
    }

    async fn update_photo(&self, id: &str, photo_url: &str) -> Result<()> {
        self.update_column("photo_url", id, photo_url.to_string()).await
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.update_column("password_hash", id, password_hash.to_string()).await
    }

    async fn mark_email_verified(&self, id: &str) -> Result<()> {
        let sql = "UPDATE accounts SET email_verified = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(true)
                    .bind(now)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .map(|_| ())
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(true)
                    .bind(now)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .map(|_| ())
            }
        }
        .context("Failed to mark email verified")
    }
}

impl SqlxAccountRepository {
    /// `column` is always a literal from this module.
    async fn update_column(&self, column: &'static str, id: &str, value: String) -> Result<()> {
        let sql = format!("UPDATE accounts SET {} = ?, updated_at = ? WHERE id = ?", column);
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(&sql)
                    .bind(value)
                    .bind(now)
                    .bind(id)
                    .execute(self.pool.sqlite()?)
                    .await
                    .map(|_| ())
            }
            DatabaseDriver::Mysql => {
                sqlx::query(&sql)
                    .bind(value)
                    .bind(now)
                    .bind(id)
                    .execute(self.pool.mysql()?)
                    .await
                    .map(|_| ())
            }
        }
        .with_context(|| format!("Failed to update account {}", column))
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_account_sqlite(pool: &SqlitePool, account: &Account) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, display_name, photo_url, email_verified, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&account.id)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(&account.display_name)
    .bind(&account.photo_url)
    .bind(account.email_verified)
    .bind(account.role.to_string())
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(pool)
    .await
    .context("Failed to create account")?;
    Ok(())
}

fn row_to_account_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
    let role: String = row.get("role");
    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        photo_url: row.get("photo_url"),
        email_verified: row.get("email_verified"),
        role: role.parse::<AccountRole>().map_err(anyhow::Error::msg)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_account_mysql(pool: &MySqlPool, account: &Account) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, display_name, photo_url, email_verified, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&account.id)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(&account.display_name)
    .bind(&account.photo_url)
    .bind(account.email_verified)
    .bind(account.role.to_string())
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(pool)
    .await
    .context("Failed to create account")?;
    Ok(())
}

fn row_to_account_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Account> {
    let role: String = row.get("role");
    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        photo_url: row.get("photo_url"),
        email_verified: row.get("email_verified"),
        role: role.parse::<AccountRole>().map_err(anyhow::Error::msg)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxAccountRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxAccountRepository::new(pool)
    }

    fn account(email: &str) -> Account {
        Account::new(
            email.to_string(),
            "hash".to_string(),
            "Test User".to_string(),
            AccountRole::Member,
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup_test_repo().await;
        let created = repo.create(&account("Ana@Example.com")).await.unwrap();
        assert_eq!(created.email, "ana@example.com");

        let by_id = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ana@example.com");
        assert_eq!(by_id.role, AccountRole::Member);
        assert!(!by_id.email_verified);

        let by_email = repo.get_by_email("  ANA@example.COM ").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = setup_test_repo().await;
        repo.create(&account("dup@example.com")).await.unwrap();
        assert!(repo.create(&account("DUP@example.com")).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_updates() {
        let repo = setup_test_repo().await;
        let created = repo.create(&account("u@example.com")).await.unwrap();

        repo.update_photo(&created.id, "/uploads/profile-pictures/x.png").await.unwrap();
        repo.update_password(&created.id, "new-hash").await.unwrap();
        repo.mark_email_verified(&created.id).await.unwrap();

        let reread = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(reread.photo_url.as_deref(), Some("/uploads/profile-pictures/x.png"));
        assert_eq!(reread.password_hash, "new-hash");
        assert!(reread.email_verified);
    }

    #[tokio::test]
    async fn test_missing_account() {
        let repo = setup_test_repo().await;
        assert!(repo.get_by_id("nope").await.unwrap().is_none());
        assert!(repo.get_by_email("nope@example.com").await.unwrap().is_none());
    }
}
