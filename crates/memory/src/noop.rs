//! No-op memory backend: disables persistent memory entirely.

use async_trait::async_trait;
use chrono::Utc;
use crewloop_core::error::MemoryError;
use crewloop_core::memory::{MemoryRecord, MemoryStore, NewMemoryRecord};

/// A store that accepts every write and remembers nothing.
pub struct NoopStore;

#[async_trait]
impl MemoryStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn insert(&self, record: NewMemoryRecord) -> Result<MemoryRecord, MemoryError> {
        let metadata = record.metadata_text()?;
        Ok(MemoryRecord {
            id: String::new(),
            user_id: record.user_id,
            agent_role: record.agent_role,
            content: record.content,
            metadata,
            created_at: Utc::now(),
        })
    }

    async fn recent(&self, _user_id: &str, _limit: usize) -> Result<Vec<MemoryRecord>, MemoryError> {
        Ok(Vec::new())
    }

    async fn count(&self, _user_id: &str) -> Result<usize, MemoryError> {
        Ok(0)
    }
}
