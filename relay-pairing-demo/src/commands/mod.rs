//! CLI command implementations

use std::path::{Path, PathBuf};

use relay_pairing::storage::FileChannelStore;
use relay_pairing::Channel;

use crate::ui;

pub mod forget;
pub mod new;
pub mod show;
pub mod simulate;

/// Environment variable overriding the storage directory.
pub const STORAGE_DIR_ENV: &str = "RELAY_PAIRING_DIR";

/// Pick the storage directory: flag, then environment, then the user config dir.
pub fn resolve_storage_dir(flag: Option<&str>) -> PathBuf {
    resolve_storage_dir_from(flag, std::env::var(STORAGE_DIR_ENV).ok())
}

fn resolve_storage_dir_from(flag: Option<&str>, env: Option<String>) -> PathBuf {
    if let Some(dir) = flag {
        return PathBuf::from(dir);
    }
    match env {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("relay-pairing"),
    }
}

/// Channel store inside the storage directory.
pub fn channel_store(storage_dir: &Path) -> FileChannelStore {
    FileChannelStore::in_dir(storage_dir)
}

/// Print the identifying details of a channel, never its key.
pub fn print_channel(channel: &Channel, store: &FileChannelStore) {
    ui::field("Channel ID", channel.id());
    ui::field("Stored at", &store.path().display().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins() {
        let dir = resolve_storage_dir_from(Some("/tmp/flag"), Some("/tmp/env".into()));
        assert_eq!(dir, PathBuf::from("/tmp/flag"));
    }

    #[test]
    fn test_env_used_without_flag() {
        let dir = resolve_storage_dir_from(None, Some("/tmp/env".into()));
        assert_eq!(dir, PathBuf::from("/tmp/env"));
    }

    #[test]
    fn test_default_dir() {
        let dir = resolve_storage_dir_from(None, Some(String::new()));
        assert!(dir.ends_with("relay-pairing"));
    }
}
