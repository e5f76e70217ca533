//! The recorder the loop writes through.
//!
//! Storage problems are logged and swallowed here: a run keeps going even
//! if every write fails, and a failed read looks like an empty history.

use std::sync::Arc;

use crewloop_core::agent::AgentRole;
use crewloop_core::memory::{MemoryRecord, MemoryStore, NewMemoryRecord};
use tracing::{debug, warn};

use crate::noop::NoopStore;

#[derive(Clone)]
pub struct MemoryRecorder {
    store: Arc<dyn MemoryStore>,
}

impl MemoryRecorder {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// A recorder that drops every row.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopStore))
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Append one row. Failures are logged, never returned.
    pub async fn record(
        &self,
        user_id: &str,
        role: AgentRole,
        content: &str,
        metadata: Option<serde_json::Value>,
    ) {
        let row = NewMemoryRecord {
            user_id: user_id.to_string(),
            agent_role: role,
            content: content.to_string(),
            metadata,
        };

        match self.store.insert(row).await {
            Ok(stored) => debug!(id = %stored.id, %role, store = self.store.name(), "Memory recorded"),
            Err(e) => warn!(%role, store = self.store.name(), error = %e, "Failed to save memory"),
        }
    }

    /// Up to `limit` of the user's rows, newest first. Empty on failure.
    pub async fn fetch(&self, user_id: &str, limit: usize) -> Vec<MemoryRecord> {
        match self.store.recent(user_id, limit).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "Failed to get memories");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for MemoryRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRecorder")
            .field("store", &self.store.name())
            .finish()
    }
}
