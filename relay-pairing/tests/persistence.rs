//! Saving, restoring and forgetting the paired channel.

use proptest::prelude::*;
use relay_pairing::storage::{ChannelStore, FileChannelStore, InMemoryChannelStore, CHANNEL_FILE_NAME};
use relay_pairing::{Channel, ChannelRecord, RelayError, Result};
use tempfile::TempDir;

/// A store whose reads always fail.
struct BrokenStore;

impl ChannelStore for BrokenStore {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Err(RelayError::Persistence("disk unplugged".into()))
    }

    async fn write(&self, _record: &[u8]) -> Result<()> {
        Err(RelayError::Persistence("disk unplugged".into()))
    }

    async fn remove(&self) -> Result<()> {
        Err(RelayError::Persistence("disk unplugged".into()))
    }
}

#[tokio::test]
async fn test_save_then_load_in_memory() {
    let store = InMemoryChannelStore::new();
    let channel = Channel::random().unwrap();

    channel.save(&store).await.unwrap();
    let restored = Channel::load(&store).await.unwrap();

    assert_eq!(restored, channel);
    assert_eq!(restored.key().as_bytes(), channel.key().as_bytes());
}

#[tokio::test]
async fn test_load_without_record() {
    let store = InMemoryChannelStore::new();
    assert!(Channel::load(&store).await.is_none());
}

#[tokio::test]
async fn test_load_masks_corrupt_records() {
    let truncated = InMemoryChannelStore::with_record(r#"{"id":"abc","#);
    assert!(Channel::load(&truncated).await.is_none());

    let wrong_shape = InMemoryChannelStore::with_record(r#"{"channel":"abc"}"#);
    assert!(Channel::load(&wrong_shape).await.is_none());

    let bad_key = InMemoryChannelStore::with_record(r#"{"id":"abc","key":"AAAA"}"#);
    assert!(Channel::load(&bad_key).await.is_none());

    let empty_id = serde_json::to_vec(&ChannelRecord {
        id: String::new(),
        key: Channel::random().unwrap().to_record().key,
    })
    .unwrap();
    assert!(Channel::load(&InMemoryChannelStore::with_record(empty_id))
        .await
        .is_none());
}

#[tokio::test]
async fn test_load_masks_read_errors() {
    assert!(Channel::load(&BrokenStore).await.is_none());
}

#[tokio::test]
async fn test_save_propagates_write_errors() {
    let channel = Channel::random().unwrap();
    let err = channel.save(&BrokenStore).await.unwrap_err();
    assert!(matches!(err, RelayError::Persistence(_)));
}

#[tokio::test]
async fn test_save_replaces_earlier_channel() {
    let store = InMemoryChannelStore::new();
    let first = Channel::random().unwrap();
    let second = Channel::random().unwrap();

    first.save(&store).await.unwrap();
    second.save(&store).await.unwrap();

    assert_eq!(Channel::load(&store).await.unwrap(), second);
}

#[tokio::test]
async fn test_forget_clears_record() {
    let store = InMemoryChannelStore::new();
    Channel::random().unwrap().save(&store).await.unwrap();

    Channel::forget(&store).await.unwrap();
    assert!(Channel::load(&store).await.is_none());
    Channel::forget(&store).await.unwrap();
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let channel = Channel::random().unwrap();

    channel
        .save(&FileChannelStore::in_dir(dir.path()))
        .await
        .unwrap();

    let reopened = FileChannelStore::in_dir(dir.path());
    assert_eq!(reopened.path(), dir.path().join(CHANNEL_FILE_NAME));
    assert_eq!(Channel::load(&reopened).await.unwrap(), channel);
}

#[tokio::test]
async fn test_file_store_record_is_json() {
    let dir = TempDir::new().unwrap();
    let store = FileChannelStore::in_dir(dir.path());
    let channel = Channel::random().unwrap();
    channel.save(&store).await.unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    let record: ChannelRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record, channel.to_record());
}

#[tokio::test]
async fn test_file_store_corrupt_file_loads_none() {
    let dir = TempDir::new().unwrap();
    let store = FileChannelStore::in_dir(dir.path());
    std::fs::write(store.path(), b"\x00\x01 not json").unwrap();

    assert!(Channel::load(&store).await.is_none());
}

#[tokio::test]
async fn test_file_store_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileChannelStore::in_dir(&nested);
    let channel = Channel::random().unwrap();

    channel.save(&store).await.unwrap();
    assert_eq!(Channel::load(&store).await.unwrap(), channel);
}

fn base58_id() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), 1..48).prop_map(|bytes| bs58::encode(bytes).into_string())
}

proptest! {
    #[test]
    fn prop_save_load_round_trip(id in base58_id(), key in any::<[u8; 32]>()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let channel = Channel::new(id, key).unwrap();
        let store = InMemoryChannelStore::new();

        let restored = runtime.block_on(async {
            channel.save(&store).await.unwrap();
            Channel::load(&store).await
        });

        prop_assert_eq!(restored, Some(channel));
    }

    #[test]
    fn prop_pairing_payload_restores_channel(id in base58_id(), key in any::<[u8; 32]>()) {
        let channel = Channel::new(id, key).unwrap();
        let payload = channel.pairing_payload().unwrap();
        let record: ChannelRecord = serde_json::from_str(&payload).unwrap();
        prop_assert_eq!(Channel::from_record(&record).unwrap(), channel);
    }
}
