//! Memory log backends for crewloop.
//!
//! Every backend implements [`MemoryStore`]; the loop only ever talks to the
//! [`MemoryRecorder`] wrapper, which never lets a storage failure escape.

pub mod in_memory;
pub mod noop;
pub mod recorder;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;

use crewloop_config::{MemoryBackendKind, MemoryConfig};
use crewloop_core::error::MemoryError;
use crewloop_core::memory::MemoryStore;
use tracing::info;

pub use in_memory::InMemoryStore;
pub use noop::NoopStore;
pub use recorder::MemoryRecorder;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

/// Open the backend selected by configuration.
pub async fn open_store(config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>, MemoryError> {
    info!(backend = %config.backend, "Opening memory store");

    match config.backend {
        MemoryBackendKind::None => Ok(Arc::new(NoopStore)),
        MemoryBackendKind::InMemory => Ok(Arc::new(InMemoryStore::new())),
        MemoryBackendKind::Sqlite => open_sqlite(config).await,
        MemoryBackendKind::Postgres => open_postgres(config).await,
    }
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>, MemoryError> {
    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| MemoryError::Storage(format!("Cannot create {}: {e}", parent.display())))?;
    }
    let path = config.path.to_string_lossy();
    Ok(Arc::new(SqliteStore::new(&path).await?))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>, MemoryError> {
    Err(MemoryError::Storage(
        "SQLite support not compiled in (enable the `sqlite` feature)".into(),
    ))
}

#[cfg(feature = "postgres")]
async fn open_postgres(config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>, MemoryError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| MemoryError::Storage("memory.database_url is not set".into()))?;
    let store = PostgresStore::connect(url).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(_config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>, MemoryError> {
    Err(MemoryError::Storage(
        "PostgreSQL support not compiled in (enable the `postgres` feature)".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: MemoryBackendKind) -> MemoryConfig {
        MemoryConfig {
            backend,
            ..MemoryConfig::default()
        }
    }

    #[tokio::test]
    async fn opens_none_and_in_memory() {
        let none = open_store(&config(MemoryBackendKind::None)).await.unwrap();
        assert_eq!(none.name(), "none");

        let mem = open_store(&config(MemoryBackendKind::InMemory)).await.unwrap();
        assert_eq!(mem.name(), "in_memory");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn opens_sqlite_creating_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(MemoryBackendKind::Sqlite);
        cfg.path = dir.path().join("nested").join("memory.sqlite");

        let store = open_store(&cfg).await.unwrap();
        assert_eq!(store.name(), "sqlite");
        assert!(cfg.path.exists());
    }

    #[cfg(not(feature = "postgres"))]
    #[tokio::test]
    async fn postgres_without_feature_is_an_error() {
        let result = open_store(&config(MemoryBackendKind::Postgres)).await;
        assert!(result.is_err());
    }
}
