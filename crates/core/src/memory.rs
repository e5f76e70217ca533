//! Memory store trait: the durable log of what each run produced.
//!
//! Rows are appended once and never updated or deleted by the loop. Reads
//! are per user, newest first, capped by the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentRole;
use crate::error::MemoryError;

/// A persisted memory row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    /// Unique row ID
    pub id: String,

    /// Owner of the row
    pub user_id: String,

    /// Which actor produced the content
    pub agent_role: AgentRole,

    /// The content, verbatim
    pub content: String,

    /// JSON-encoded extra data (tool trace, routing decision)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    /// Insertion time
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Decode the metadata column, if present and valid JSON.
    pub fn metadata_json(&self) -> Option<serde_json::Value> {
        self.metadata
            .as_deref()
            .and_then(|m| serde_json::from_str(m).ok())
    }
}

/// A row about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemoryRecord {
    pub user_id: String,
    pub agent_role: AgentRole,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

impl NewMemoryRecord {
    /// Encode metadata the way stores keep it: as JSON text.
    pub fn metadata_text(&self) -> Result<Option<String>, MemoryError> {
        self.metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| MemoryError::Serialization(e.to_string()))
    }
}

/// The core MemoryStore trait.
///
/// Implementations: SQLite, PostgreSQL, in-memory (for testing), none (no-op).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "postgres", "none").
    fn name(&self) -> &str;

    /// Append one row and return it as stored.
    async fn insert(&self, record: NewMemoryRecord) -> Result<MemoryRecord, MemoryError>;

    /// Up to `limit` rows for `user_id`, most recent first.
    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// Number of rows stored for `user_id`.
    async fn count(&self, user_id: &str) -> Result<usize, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_text_encodes_json() {
        let record = NewMemoryRecord {
            user_id: "u1".into(),
            agent_role: AgentRole::Coder,
            content: "done".into(),
            metadata: Some(serde_json::json!({"tool": "web_search"})),
        };
        assert_eq!(
            record.metadata_text().unwrap().as_deref(),
            Some(r#"{"tool":"web_search"}"#)
        );
    }

    #[test]
    fn metadata_text_none_when_absent() {
        let record = NewMemoryRecord {
            user_id: "u1".into(),
            agent_role: AgentRole::Supervisor,
            content: "plan".into(),
            metadata: None,
        };
        assert!(record.metadata_text().unwrap().is_none());
    }

    #[test]
    fn metadata_json_ignores_garbage() {
        let record = MemoryRecord {
            id: "1".into(),
            user_id: "u1".into(),
            agent_role: AgentRole::Tester,
            content: "ok".into(),
            metadata: Some("{broken".into()),
            created_at: Utc::now(),
        };
        assert!(record.metadata_json().is_none());
    }
}
