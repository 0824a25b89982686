//! Session repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Look up a session by its token
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Sign an account out everywhere
    async fn delete_by_account(&self, account_id: &str) -> Result<u64>;

    async fn delete_expired(&self) -> Result<u64>;
}

pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }

    async fn execute_with_str(&self, sql: &str, arg: &str) -> Result<u64> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(arg)
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(arg)
                .execute(self.pool.mysql()?)
                .await
                .map(|r| r.rows_affected()),
        }?;
        Ok(affected)
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        let sql = "INSERT INTO sessions (id, account_id, expires_at, created_at) VALUES (?, ?, ?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&session.id)
                .bind(&session.account_id)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(self.pool.sqlite()?)
                .await
                .map(|_| ()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&session.id)
                .bind(&session.account_id)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(self.pool.mysql()?)
                .await
                .map(|_| ()),
        }
        .context("Failed to create session")?;

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        let sql = "SELECT id, account_id, expires_at, created_at FROM sessions WHERE id = ?";
        let session = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .fetch_optional(self.pool.sqlite()?)
                .await
                .map(|row| {
                    row.map(|row| Session {
                        id: row.get("id"),
                        account_id: row.get("account_id"),
                        expires_at: row.get("expires_at"),
                        created_at: row.get("created_at"),
                    })
                }),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .fetch_optional(self.pool.mysql()?)
                .await
                .map(|row| {
                    row.map(|row| Session {
                        id: row.get("id"),
                        account_id: row.get("account_id"),
                        expires_at: row.get("expires_at"),
                        created_at: row.get("created_at"),
                    })
                }),
        }
        .context("Failed to get session by ID")?;

        Ok(session)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.execute_with_str("DELETE FROM sessions WHERE id = ?", id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<u64> {
        self.execute_with_str("DELETE FROM sessions WHERE account_id = ?", account_id)
            .await
            .context("Failed to delete sessions by account")
    }

    async fn delete_expired(&self) -> Result<u64> {
        let sql = "DELETE FROM sessions WHERE expires_at < ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(now)
                .execute(self.pool.sqlite()?)
                .await
                .map(|r| r.rows_affected()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(now)
                .execute(self.pool.mysql()?)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete expired sessions")?;
        Ok(affected)
    }
}
