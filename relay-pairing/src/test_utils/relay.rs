//! In-memory store-and-forward relay.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::{Channel, RelayError, RelayServer, RelayTransport, Result};

/// Which side of a channel a relay handle acts for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The desktop app.
    Desktop,
    /// The mobile companion.
    Mobile,
}

impl Side {
    /// The other side of the channel.
    pub fn peer(self) -> Self {
        match self {
            Self::Desktop => Self::Mobile,
            Self::Mobile => Self::Desktop,
        }
    }
}

/// One push observed by the relay.
#[derive(Clone, Debug, PartialEq)]
pub struct PushRecord {
    /// Server the push was addressed to.
    pub server: RelayServer,
    /// Channel identifier.
    pub channel_id: String,
    /// Side that pushed.
    pub from: Side,
    /// Plaintext payload.
    pub payload: Vec<u8>,
}

impl PushRecord {
    /// Payload decoded as JSON, or `Value::Null` if it is not JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Default)]
struct RelayState {
    /// Pending messages keyed by channel id and recipient side.
    queues: HashMap<(String, Side), VecDeque<Vec<u8>>>,
    pushes: Vec<PushRecord>,
    pull_count: usize,
    failing_pulls: usize,
    failing_pushes: usize,
}

/// A simulated relay server shared by both sides of a channel.
///
/// Payloads are stored in plaintext; encryption belongs to real transports.
#[derive(Clone, Default)]
pub struct InMemoryRelay {
    state: Arc<Mutex<RelayState>>,
}

impl InMemoryRelay {
    /// Create an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport handle acting for `side`.
    pub fn endpoint(&self, side: Side) -> RelayEndpoint {
        RelayEndpoint {
            relay: self.clone(),
            side,
        }
    }

    /// Queue a raw payload for `recipient` without recording a push.
    pub fn enqueue(&self, recipient: Side, channel_id: &str, payload: impl Into<Vec<u8>>) {
        self.state()
            .queues
            .entry((channel_id.to_string(), recipient))
            .or_default()
            .push_back(payload.into());
    }

    /// Queue a JSON payload for `recipient` without recording a push.
    pub fn enqueue_json(&self, recipient: Side, channel_id: &str, value: &serde_json::Value) {
        self.enqueue(recipient, channel_id, value.to_string());
    }

    /// Number of messages waiting for `recipient`.
    pub fn pending(&self, recipient: Side, channel_id: &str) -> usize {
        self.state()
            .queues
            .get(&(channel_id.to_string(), recipient))
            .map(|q| q.len())
            .unwrap_or(0)
    }

    /// Every push seen so far, in order.
    pub fn pushes(&self) -> Vec<PushRecord> {
        self.state().pushes.clone()
    }

    /// JSON payloads pushed by `from`, in order.
    pub fn pushed_json(&self, from: Side) -> Vec<serde_json::Value> {
        self.state()
            .pushes
            .iter()
            .filter(|p| p.from == from)
            .map(PushRecord::json)
            .collect()
    }

    /// Number of pull attempts, including failed and empty ones.
    pub fn pull_count(&self) -> usize {
        self.state().pull_count
    }

    /// Make the next `count` pulls fail with a transport error.
    pub fn fail_next_pulls(&self, count: usize) {
        self.state().failing_pulls = count;
    }

    /// Make the next `count` pushes fail with a transport error.
    pub fn fail_next_pushes(&self, count: usize) {
        self.state().failing_pushes = count;
    }

    fn state(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One side's view of an [`InMemoryRelay`].
#[derive(Clone)]
pub struct RelayEndpoint {
    relay: InMemoryRelay,
    side: Side,
}

impl RelayEndpoint {
    /// The side this handle acts for.
    pub fn side(&self) -> Side {
        self.side
    }

    /// The relay behind this handle.
    pub fn relay(&self) -> &InMemoryRelay {
        &self.relay
    }
}

#[async_trait]
impl RelayTransport for RelayEndpoint {
    async fn push(&self, server: &RelayServer, channel: &Channel, payload: &[u8]) -> Result<()> {
        let mut state = self.relay.state();
        if state.failing_pushes > 0 {
            state.failing_pushes -= 1;
            return Err(RelayError::Transport("simulated push failure".into()));
        }
        state.pushes.push(PushRecord {
            server: server.clone(),
            channel_id: channel.id().to_string(),
            from: self.side,
            payload: payload.to_vec(),
        });
        state
            .queues
            .entry((channel.id().to_string(), self.side.peer()))
            .or_default()
            .push_back(payload.to_vec());
        Ok(())
    }

    async fn pull_oldest(
        &self,
        _server: &RelayServer,
        channel: &Channel,
    ) -> Result<Option<Vec<u8>>> {
        let mut state = self.relay.state();
        state.pull_count += 1;
        if state.failing_pulls > 0 {
            state.failing_pulls -= 1;
            return Err(RelayError::Transport("simulated pull failure".into()));
        }
        Ok(state
            .queues
            .get_mut(&(channel.id().to_string(), self.side))
            .and_then(VecDeque::pop_front))
    }
}
