//! Core trait for channel persistence.

use std::future::Future;

use crate::Result;

/// Storage for the single persisted channel record.
///
/// Implementations should never log the record: it contains the channel key.
pub trait ChannelStore: Send + Sync {
    /// Read the stored record.
    ///
    /// # Returns
    /// The raw record bytes, or None if nothing has been stored.
    fn read(&self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store the record, replacing any earlier one.
    ///
    /// # Errors
    /// - `Persistence` if the record could not be written
    fn write(&self, record: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Remove the stored record. Removing a missing record is not an error.
    fn remove(&self) -> impl Future<Output = Result<()>> + Send;
}
