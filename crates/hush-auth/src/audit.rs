//! Audit log of every command that reached a verdict.

use hush_core::{config::AuditConfig, error::HushError, shellexpand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// An entry to write to the audit log.
pub struct AuditEntry {
    pub sender: String,
    pub command: String,
    pub status: AuditStatus,
    pub detail: Option<String>,
}

/// Status of an audited command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Executed,
    Denied,
    Errored,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::Denied => "denied",
            Self::Errored => "errored",
        }
    }
}

/// Audit logger backed by SQLite.
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    /// Open (or create) the audit database described by `config`.
    pub async fn open(config: &AuditConfig) -> Result<Self, HushError> {
        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HushError::Persistence(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| HushError::Persistence(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(opts)
            .await
            .map_err(|e| HushError::Persistence(format!("failed to connect to sqlite: {e}")))?;

        let logger = Self::with_pool(pool).await?;
        info!("audit log initialized at {db_path}");
        Ok(logger)
    }

    /// Wrap an existing pool, creating the table if needed.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, HushError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id TEXT PRIMARY KEY,
                sender TEXT NOT NULL,
                command TEXT NOT NULL,
                status TEXT NOT NULL,
                detail TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_audit_sender ON audit_log(sender);",
        )
        .execute(&pool)
        .await
        .map_err(|e| HushError::Persistence(format!("failed to create audit table: {e}")))?;

        Ok(Self { pool })
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &AuditEntry) -> Result<(), HushError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO audit_log (id, sender, command, status, detail) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.sender)
        .bind(&entry.command)
        .bind(entry.status.as_str())
        .bind(&entry.detail)
        .execute(&self.pool)
        .await
        .map_err(|e| HushError::Persistence(format!("audit log write failed: {e}")))?;

        debug!(
            "audit: {} {} [{}]",
            entry.sender,
            entry.command,
            entry.status.as_str()
        );

        Ok(())
    }

    /// Most recent entries as `(sender, command, status)`, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<(String, String, String)>, HushError> {
        sqlx::query_as(
            "SELECT sender, command, status FROM audit_log \
             ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HushError::Persistence(format!("audit log read failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_logger() -> AuditLogger {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .unwrap();
        AuditLogger::with_pool(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_log_and_read_back() {
        let audit = test_logger().await;
        audit
            .log(&AuditEntry {
                sender: "1@s.whatsapp.net".into(),
                command: "ping".into(),
                status: AuditStatus::Executed,
                detail: None,
            })
            .await
            .unwrap();
        audit
            .log(&AuditEntry {
                sender: "2@s.whatsapp.net".into(),
                command: "debug".into(),
                status: AuditStatus::Denied,
                detail: Some("not authorized".into()),
            })
            .await
            .unwrap();

        let rows = audit.recent(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            ("2@s.whatsapp.net".into(), "debug".into(), "denied".into())
        );
        assert_eq!(rows[1].2, "executed");
    }

    #[tokio::test]
    async fn test_with_pool_is_idempotent() {
        let audit = test_logger().await;
        let again = AuditLogger::with_pool(audit.pool.clone()).await;
        assert!(again.is_ok());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(AuditStatus::Executed.as_str(), "executed");
        assert_eq!(AuditStatus::Denied.as_str(), "denied");
        assert_eq!(AuditStatus::Errored.as_str(), "errored");
    }
}
