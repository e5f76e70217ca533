//! In-memory backend: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use crewloop_core::error::MemoryError;
use crewloop_core::memory::{MemoryRecord, MemoryStore, NewMemoryRecord};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An in-memory store that keeps rows in insertion order.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Clone)]
pub struct InMemoryStore {
    rows: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Snapshot of every row, oldest first.
    pub async fn all(&self) -> Vec<MemoryRecord> {
        self.rows.read().await.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(&self, record: NewMemoryRecord) -> Result<MemoryRecord, MemoryError> {
        let stored = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            metadata: record.metadata_text()?,
            user_id: record.user_id,
            agent_role: record.agent_role,
            content: record.content,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        let rows = self.rows.read().await;
        // Insertion order is chronological, so walking backwards is newest first.
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, user_id: &str) -> Result<usize, MemoryError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .count())
    }
}
