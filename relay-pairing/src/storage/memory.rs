//! In-memory channel store.
//!
//! Useful for tests and for sessions that must not touch disk. Lock
//! poisoning is reported as a persistence error rather than a panic.

use std::sync::RwLock;

use super::traits::ChannelStore;
use crate::{RelayError, Result};

/// Channel store that keeps the record in process memory.
#[derive(Default)]
pub struct InMemoryChannelStore {
    record: RwLock<Option<Vec<u8>>>,
}

fn lock_error(context: &str) -> RelayError {
    RelayError::Persistence(format!(
        "InMemoryChannelStore: lock poisoned during {}",
        context
    ))
}

impl InMemoryChannelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with raw record bytes.
    pub fn with_record(record: impl Into<Vec<u8>>) -> Self {
        Self {
            record: RwLock::new(Some(record.into())),
        }
    }

    /// Check if a record is stored.
    ///
    /// Returns false if the lock is poisoned.
    pub fn has_record(&self) -> bool {
        self.record.read().map(|r| r.is_some()).unwrap_or(false)
    }
}

impl ChannelStore for InMemoryChannelStore {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        let record = self.record.read().map_err(|_| lock_error("read"))?;
        Ok(record.clone())
    }

    async fn write(&self, record: &[u8]) -> Result<()> {
        let mut stored = self.record.write().map_err(|_| lock_error("write"))?;
        *stored = Some(record.to_vec());
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        let mut stored = self.record.write().map_err(|_| lock_error("remove"))?;
        *stored = None;
        Ok(())
    }
}
