use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use vocab_core::model::{ProgressCursor, ProgressKey};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of one progress cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub key: ProgressKey,
    pub cursor: ProgressCursor,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(key: ProgressKey, cursor: ProgressCursor) -> Self {
        Self { key, cursor }
    }
}

/// Durable home of the cursor table.
///
/// The progress store keeps the live table in memory and only talks to this
/// trait at startup (`load_cursors`) and when flushing (`flush_cursors`).
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Read back every cursor written by the last successful flush.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the table cannot be read or a row is invalid.
    async fn load_cursors(&self) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Upsert every record in one transaction.
    ///
    /// Either all records are written or none are; rows not named in `records`
    /// are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the transaction cannot be committed.
    async fn flush_cursors(&self, records: &[ProgressRecord]) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// `set_unavailable(true)` makes every flush fail, which lets callers exercise
/// their persistence-failure paths.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    cursors: Arc<Mutex<HashMap<ProgressKey, ProgressCursor>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of cursors currently persisted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn persisted_len(&self) -> Result<usize, StorageError> {
        let guard = self
            .cursors
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_cursors(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .cursors
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .map(|(key, cursor)| ProgressRecord::new(key.clone(), cursor.clone()))
            .collect())
    }

    async fn flush_cursors(&self, records: &[ProgressRecord]) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("repository unavailable".into()));
        }
        let mut guard = self
            .cursors
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for record in records {
            guard.insert(record.key.clone(), record.cursor.clone());
        }
        Ok(())
    }
}

/// Aggregates repository trait objects for easy wiring/swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository, keeping a handle for inspection.
    #[must_use]
    pub fn from_memory(repo: InMemoryRepository) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { progress }
    }
}
