//! Channel identity: the relay address and symmetric key of one pairing.
//!
//! A [`Channel`] is created fresh when the user starts pairing, or restored
//! from a [`ChannelStore`] to resume an earlier pairing. It is immutable and
//! can be shared freely by reference.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::storage::ChannelStore;
use crate::{RelayError, Result};

/// Number of random bytes behind a channel identifier.
pub const CHANNEL_ID_ENTROPY: usize = 32;

/// Size of the channel encryption key in bytes.
pub const CHANNEL_KEY_SIZE: usize = 32;

/// Symmetric key the transport uses to encrypt every payload on a channel.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ChannelKey([u8; CHANNEL_KEY_SIZE]);

impl ChannelKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; CHANNEL_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; CHANNEL_KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChannelKey(<redacted>)")
    }
}

/// Serialized form of a channel.
///
/// This is both the persisted record and the pairing payload the desktop
/// shows as a QR code for the mobile to scan. The key is base64 encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelRecord {
    /// Channel identifier (base58).
    pub id: String,
    /// Encryption key (standard base64).
    pub key: String,
}

/// An encrypted communication channel between the desktop and the paired mobile.
///
/// Clones share one reader lock, so waits through any number of
/// [`MobileChannel`](crate::MobileChannel)s built from clones of the same
/// channel are serialized. A channel restored separately (for example by a
/// second [`Channel::load`]) has its own lock.
#[derive(Clone)]
pub struct Channel {
    id: String,
    key: ChannelKey,
    reader: Arc<Mutex<()>>,
}

impl Channel {
    /// Create a channel from a supplied identifier and key.
    ///
    /// The identifier must be non-empty base58.
    pub fn new(id: impl Into<String>, key: [u8; CHANNEL_KEY_SIZE]) -> Result<Self> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self {
            id,
            key: ChannelKey::new(key),
            reader: Arc::default(),
        })
    }

    /// Create a channel with a random identifier and a random key.
    ///
    /// The identifier is base58 so it never contains characters, such as
    /// base64 padding, that the relay cannot address. Fails only if the OS
    /// random number generator does.
    pub fn random() -> Result<Self> {
        let mut id_bytes = [0u8; CHANNEL_ID_ENTROPY];
        fill_random(&mut id_bytes)?;

        let mut key = [0u8; CHANNEL_KEY_SIZE];
        fill_random(&mut key)?;

        let channel = Self {
            id: bs58::encode(id_bytes).into_string(),
            key: ChannelKey::new(key),
            reader: Arc::default(),
        };
        key.zeroize();
        Ok(channel)
    }

    /// Channel identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Channel encryption key.
    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    /// Lock held by whoever is pulling from this channel.
    pub(crate) fn reader(&self) -> &Mutex<()> {
        &self.reader
    }

    /// Serialize into a record.
    pub fn to_record(&self) -> ChannelRecord {
        ChannelRecord {
            id: self.id.clone(),
            key: STANDARD.encode(self.key.as_bytes()),
        }
    }

    /// Rebuild a channel from a record, validating both fields.
    pub fn from_record(record: &ChannelRecord) -> Result<Self> {
        let mut decoded = STANDARD
            .decode(&record.key)
            .map_err(|e| RelayError::InvalidChannel(format!("key is not base64: {}", e)))?;
        if decoded.len() != CHANNEL_KEY_SIZE {
            let len = decoded.len();
            decoded.zeroize();
            return Err(RelayError::InvalidChannel(format!(
                "key must be {} bytes, got {}",
                CHANNEL_KEY_SIZE, len
            )));
        }
        let mut key = [0u8; CHANNEL_KEY_SIZE];
        key.copy_from_slice(&decoded);
        decoded.zeroize();

        let channel = Self::new(record.id.clone(), key);
        key.zeroize();
        channel
    }

    /// JSON pairing payload for the mobile, typically rendered as a QR code.
    pub fn pairing_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Restore the channel persisted in `store`.
    ///
    /// Returns `None` when nothing is stored, and also when the stored record
    /// cannot be read or is corrupt: the user pairs again instead of the
    /// application failing to start.
    pub async fn load<S: ChannelStore>(store: &S) -> Option<Self> {
        let bytes = match store.read().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(_err) => {
                relay_warn!("failed to read persisted channel: {}", _err);
                return None;
            }
        };

        let record: ChannelRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(_err) => {
                relay_warn!("ignoring malformed channel record: {}", _err);
                return None;
            }
        };

        match Self::from_record(&record) {
            Ok(channel) => Some(channel),
            Err(_err) => {
                relay_warn!("ignoring invalid channel record: {}", _err);
                None
            }
        }
    }

    /// Persist the channel to `store`, replacing any earlier record.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(channel = %self.id)))]
    pub async fn save<S: ChannelStore>(&self, store: &S) -> Result<()> {
        let bytes = serde_json::to_vec(&self.to_record())?;
        store.write(&bytes).await
    }

    /// Remove the persisted channel so the next start pairs afresh.
    pub async fn forget<S: ChannelStore>(store: &S) -> Result<()> {
        store.remove().await
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.key == other.key
    }
}

impl Eq for Channel {}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    rand::rngs::OsRng
        .try_fill_bytes(buf)
        .map_err(|e| RelayError::Randomness(e.to_string()))
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(RelayError::InvalidChannel("identifier is empty".into()));
    }
    bs58::decode(id)
        .into_vec()
        .map_err(|e| RelayError::InvalidChannel(format!("identifier is not base58: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_channels_are_distinct() {
        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        for _ in 0..256 {
            let channel = Channel::random().unwrap();
            assert!(ids.insert(channel.id().to_string()));
            assert!(keys.insert(*channel.key().as_bytes()));
        }
    }

    #[test]
    fn test_random_id_shape() {
        for _ in 0..64 {
            let channel = Channel::random().unwrap();
            let id = channel.id();
            // 32 bytes of base58 is at most 44 characters
            assert!(!id.is_empty() && id.len() <= 44, "unexpected id length {}", id.len());
            assert!(!id.contains('='));
            assert!(!id.chars().any(|c| "0OIl+/".contains(c)));
            assert_eq!(bs58::decode(id).into_vec().unwrap().len(), CHANNEL_ID_ENTROPY);
            assert_eq!(channel.key().as_bytes().len(), CHANNEL_KEY_SIZE);
        }
    }

    #[test]
    fn test_record_round_trip() {
        let channel = Channel::random().unwrap();
        let record = channel.to_record();
        let restored = Channel::from_record(&record).unwrap();
        assert_eq!(restored, channel);
    }

    #[test]
    fn test_invalid_records_rejected() {
        let good = Channel::random().unwrap().to_record();

        let short_key = ChannelRecord {
            id: good.id.clone(),
            key: STANDARD.encode([7u8; 16]),
        };
        assert!(matches!(
            Channel::from_record(&short_key),
            Err(RelayError::InvalidChannel(_))
        ));

        let bad_base64 = ChannelRecord {
            id: good.id.clone(),
            key: "not base64!".into(),
        };
        assert!(Channel::from_record(&bad_base64).is_err());

        let bad_id = ChannelRecord {
            id: "0OIl".into(),
            key: good.key.clone(),
        };
        assert!(Channel::from_record(&bad_id).is_err());

        let empty_id = ChannelRecord {
            id: String::new(),
            key: good.key,
        };
        assert!(Channel::from_record(&empty_id).is_err());
    }

    #[test]
    fn test_pairing_payload_shape() {
        let channel = Channel::new("3yZe7d", [1u8; 32]).unwrap();
        let payload: serde_json::Value =
            serde_json::from_str(&channel.pairing_payload().unwrap()).unwrap();
        assert_eq!(payload["id"], "3yZe7d");
        assert_eq!(payload["key"], STANDARD.encode([1u8; 32]));
        assert_eq!(payload.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_debug_redacts_key() {
        let channel = Channel::new("3yZe7d", [0xAB; 32]).unwrap();
        let debug = format!("{:?}", channel);
        assert!(debug.contains("3yZe7d"));
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("171"));
    }
}
