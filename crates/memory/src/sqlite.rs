//! SQLite memory backend.
//!
//! A single `memories` table. The integer `iid` column is the insertion
//! order; reads sort on `created_at` and fall back to `iid` so rows written
//! within the same clock tick still come back newest first.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use crewloop_core::agent::AgentRole;
use crewloop_core::error::MemoryError;
use crewloop_core::memory::{MemoryRecord, MemoryStore, NewMemoryRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// A SQLite-backed memory log.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and migrate it.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful
    /// for tests).
    pub async fn new(path: &str) -> Result<Self, MemoryError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // One connection: an in-memory database is private to its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite memory store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, MemoryError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                user_id     TEXT NOT NULL,
                agent_role  TEXT NOT NULL,
                content     TEXT NOT NULL,
                metadata    TEXT,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("memories table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memories_user_created ON memories(user_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("user_id index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryRecord, MemoryError> {
        let column = |name: &str, e: sqlx::Error| MemoryError::QueryFailed(format!("{name} column: {e}"));

        let id: String = row.try_get("id").map_err(|e| column("id", e))?;
        let user_id: String = row.try_get("user_id").map_err(|e| column("user_id", e))?;
        let role: String = row.try_get("agent_role").map_err(|e| column("agent_role", e))?;
        let content: String = row.try_get("content").map_err(|e| column("content", e))?;
        let metadata: Option<String> = row.try_get("metadata").map_err(|e| column("metadata", e))?;
        let created_at: String = row.try_get("created_at").map_err(|e| column("created_at", e))?;

        let agent_role = AgentRole::from_str(&role).map_err(MemoryError::QueryFailed)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| MemoryError::QueryFailed(format!("created_at value: {e}")))?;

        Ok(MemoryRecord {
            id,
            user_id,
            agent_role,
            content,
            metadata,
            created_at,
        })
    }
}

#[async_trait]
impl MemoryStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, record: NewMemoryRecord) -> Result<MemoryRecord, MemoryError> {
        let metadata = record.metadata_text()?;
        let stored = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            user_id: record.user_id,
            agent_role: record.agent_role,
            content: record.content,
            metadata,
            created_at: Utc::now(),
        };

        // Fixed-width timestamps keep lexical order equal to time order.
        let created_at = stored.created_at.to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(
            r#"
            INSERT INTO memories (id, user_id, agent_role, content, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.user_id)
        .bind(stored.agent_role.as_str())
        .bind(&stored.content)
        .bind(&stored.metadata)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("INSERT failed: {e}")))?;

        debug!(id = %stored.id, role = %stored.agent_role, "Stored memory");
        Ok(stored)
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, agent_role, content, metadata, created_at
            FROM memories
            WHERE user_id = ?1
            ORDER BY created_at DESC, iid DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("recent: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self, user_id: &str) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM memories WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("count: {e}")))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| MemoryError::QueryFailed(format!("count column: {e}")))?;
        Ok(count as usize)
    }
}
