use std::sync::Arc;

use async_trait::async_trait;

use crate::{Channel, RelayServer, Result};

/// Store-and-forward access to a relay server.
///
/// Implementations encrypt outgoing payloads and decrypt incoming ones with
/// the channel key; the core only sees plaintext JSON bytes. Each call names
/// the server and channel explicitly, so a handle may be shared between
/// sessions or created per call.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    /// Encrypts `payload` under the channel key and enqueues it for the peer.
    async fn push(&self, server: &RelayServer, channel: &Channel, payload: &[u8]) -> Result<()>;

    /// Dequeues and decrypts the oldest message waiting for this side.
    ///
    /// Returns None when the queue is empty. Reading is destructive: a pulled
    /// message is gone from the relay.
    async fn pull_oldest(&self, server: &RelayServer, channel: &Channel)
        -> Result<Option<Vec<u8>>>;
}

#[async_trait]
impl<T: RelayTransport + ?Sized> RelayTransport for Arc<T> {
    async fn push(&self, server: &RelayServer, channel: &Channel, payload: &[u8]) -> Result<()> {
        (**self).push(server, channel, payload).await
    }

    async fn pull_oldest(
        &self,
        server: &RelayServer,
        channel: &Channel,
    ) -> Result<Option<Vec<u8>>> {
        (**self).pull_oldest(server, channel).await
    }
}

#[async_trait]
impl<'a, T: RelayTransport + ?Sized> RelayTransport for &'a T {
    async fn push(&self, server: &RelayServer, channel: &Channel, payload: &[u8]) -> Result<()> {
        (**self).push(server, channel, payload).await
    }

    async fn pull_oldest(
        &self,
        server: &RelayServer,
        channel: &Channel,
    ) -> Result<Option<Vec<u8>>> {
        (**self).pull_oldest(server, channel).await
    }
}
