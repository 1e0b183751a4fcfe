//! JSON file channel store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::traits::ChannelStore;
use crate::{RelayError, Result};

/// File name used by [`FileChannelStore::in_dir`].
pub const CHANNEL_FILE_NAME: &str = "channel.json";

/// Channel store backed by a single file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write leaves either the old or the new record.
#[derive(Clone, Debug)]
pub struct FileChannelStore {
    path: PathBuf,
}

impl FileChannelStore {
    /// Store the record at an explicit path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store the record as [`CHANNEL_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CHANNEL_FILE_NAME))
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> RelayError {
    RelayError::Persistence(format!("failed to {} {}: {}", action, path.display(), err))
}

impl ChannelStore for FileChannelStore {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &self.path, e)),
        }
    }

    async fn write(&self, record: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
            }
        }

        let temp = self.temp_path();
        std::fs::write(&temp, record).map_err(|e| io_error("write", &temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            // the temp file holds the key
            let _ = std::fs::remove_file(&temp);
            io_error("replace", &self.path, e)
        })
    }

    async fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::in_dir(dir.path());
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::in_dir(dir.path().join("nested").join("config"));

        store.write(br#"{"id":"a","key":"b"}"#).await.unwrap();

        assert!(store.path().ends_with(CHANNEL_FILE_NAME));
        assert_eq!(
            store.read().await.unwrap(),
            Some(br#"{"id":"a","key":"b"}"#.to_vec())
        );
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::in_dir(dir.path());

        store.remove().await.unwrap();
        store.write(b"{}").await.unwrap();
        store.remove().await.unwrap();
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = FileChannelStore::in_dir(&blocker);
        let result = store.write(b"{}").await;
        assert!(matches!(result, Err(RelayError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_failed_replace_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChannelStore::in_dir(dir.path());
        // a non-empty directory where the record should go cannot be replaced
        std::fs::create_dir(store.path()).unwrap();
        std::fs::write(store.path().join("occupant"), b"x").unwrap();

        let result = store.write(br#"{"id":"a","key":"b"}"#).await;

        assert!(matches!(result, Err(RelayError::Persistence(_))));
        assert!(!store.temp_path().exists());
    }
}
