//! Login audit log

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;

/// One sign-in attempt
#[derive(Debug, Clone, PartialEq)]
pub struct LoginLogEntry {
    pub email: String,
    pub ip_address: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoginLogEntry {
    pub fn success(email: String, ip_address: Option<String>) -> Self {
        Self {
            email,
            ip_address,
            success: true,
            failure_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn failure(email: String, ip_address: Option<String>, reason: String) -> Self {
        Self {
            email,
            ip_address,
            success: false,
            failure_reason: Some(reason),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait LoginLogRepository: Send + Sync {
    async fn record(&self, entry: &LoginLogEntry) -> Result<()>;

    /// Most recent entries for an email, newest first
    async fn recent_for_email(&self, email: &str, limit: i64) -> Result<Vec<LoginLogEntry>>;
}

pub struct SqlxLoginLogRepository {
    pool: DynDatabasePool,
}

impl SqlxLoginLogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LoginLogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LoginLogRepository for SqlxLoginLogRepository {
    async fn record(&self, entry: &LoginLogEntry) -> Result<()> {
        let sql = "INSERT INTO login_logs (email, ip_address, success, failure_reason, created_at) VALUES (?, ?, ?, ?, ?)";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&entry.email)
                .bind(&entry.ip_address)
                .bind(entry.success)
                .bind(&entry.failure_reason)
                .bind(entry.created_at)
                .execute(self.pool.sqlite()?)
                .await
                .map(|_| ()),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&entry.email)
                .bind(&entry.ip_address)
                .bind(entry.success)
                .bind(&entry.failure_reason)
                .bind(entry.created_at)
                .execute(self.pool.mysql()?)
                .await
                .map(|_| ()),
        }
        .context("Failed to record login attempt")
    }

    async fn recent_for_email(&self, email: &str, limit: i64) -> Result<Vec<LoginLogEntry>> {
        let sql = "SELECT email, ip_address, success, failure_reason, created_at FROM login_logs \
                   WHERE email = ? ORDER BY id DESC LIMIT ?";
        let entries = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(email)
                .bind(limit)
                .fetch_all(self.pool.sqlite()?)
                .await
                .map(|rows| {
                    rows.iter()
                        .map(|row| LoginLogEntry {
                            email: row.get("email"),
                            ip_address: row.get("ip_address"),
                            success: row.get("success"),
                            failure_reason: row.get("failure_reason"),
                            created_at: row.get("created_at"),
                        })
                        .collect::<Vec<_>>()
                }),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(email)
                .bind(limit)
                .fetch_all(self.pool.mysql()?)
                .await
                .map(|rows| {
                    rows.iter()
                        .map(|row| LoginLogEntry {
                            email: row.get("email"),
                            ip_address: row.get("ip_address"),
                            success: row.get("success"),
                            failure_reason: row.get("failure_reason"),
                            created_at: row.get("created_at"),
                        })
                        .collect::<Vec<_>>()
                }),
        }
        .context("Failed to read login log")?;
        Ok(entries)
    }
}
