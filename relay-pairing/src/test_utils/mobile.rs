//! Simulated mobile companion.

use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::time::{sleep, Instant};

use super::relay::{InMemoryRelay, RelayEndpoint, Side};
use crate::messages::{SigningPin, ECDH_KEY, PIN_KEY};
use crate::{Channel, ChannelRecord, RelayError, RelayServer, RelayTransport, Result};

const MOBILE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Desktop message as understood by the simulated mobile.
#[derive(Clone, Debug, PartialEq)]
pub enum MobileEvent {
    /// Pairing verification value.
    VerifyPass(Value),
    /// Pairing test string to display.
    PairingTest(String),
    /// Liveness check.
    Ping,
    /// Clear screen.
    Clear,
    /// Xpub echo to display.
    XpubEcho(String),
    /// Signing echo and transaction to display.
    SigningEcho {
        /// Encrypted echo
        echo: String,
        /// Transaction summary
        tx: String,
    },
    /// Random number echo to display.
    RandomNumberEcho(String),
    /// Anything the mobile does not recognize.
    Unknown(Value),
}

/// A scripted stand-in for the mobile app.
///
/// It answers the way the real app does: `success` after the verify pass,
/// `pong` after a ping, the configured PIN after a signing echo, and
/// `random: clear` after a random number echo.
#[derive(Clone)]
pub struct SimulatedMobile {
    endpoint: RelayEndpoint,
    channel: Channel,
    server: RelayServer,
    ecdh_public_key: String,
    pin: SigningPin,
}

impl SimulatedMobile {
    /// Join the channel described by a desktop pairing payload.
    pub fn scan(relay: &InMemoryRelay, pairing_payload: &str) -> Result<Self> {
        let record: ChannelRecord = serde_json::from_str(pairing_payload)?;
        let channel = Channel::from_record(&record)?;
        Ok(Self {
            endpoint: relay.endpoint(Side::Mobile),
            channel,
            server: RelayServer::default(),
            ecdh_public_key: "02".to_string() + &"ab".repeat(32),
            pin: SigningPin::Pin("1234".into()),
        })
    }

    /// Use a different relay server.
    pub fn with_server(mut self, server: RelayServer) -> Self {
        self.server = server;
        self
    }

    /// Answer signing echoes with `pin`.
    pub fn with_pin(mut self, pin: SigningPin) -> Self {
        self.pin = pin;
        self
    }

    /// Announce `key` as the mobile's ECDH public key.
    pub fn with_public_key(mut self, key: impl Into<String>) -> Self {
        self.ecdh_public_key = key.into();
        self
    }

    /// The channel the mobile joined.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Push the ECDH public key, as the app does right after scanning.
    pub async fn send_public_key(&self) -> Result<()> {
        self.send(&json!({ ECDH_KEY: self.ecdh_public_key })).await
    }

    /// Push an arbitrary JSON message to the desktop.
    pub async fn send(&self, value: &Value) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.endpoint
            .push(&self.server, &self.channel, &payload)
            .await
    }

    /// Wait up to `timeout` for the next desktop message and answer it.
    ///
    /// Returns None if nothing arrived in time.
    pub async fn respond(&self, timeout: Duration) -> Result<Option<MobileEvent>> {
        let deadline = crate::poll::deadline_after(timeout);
        let payload = loop {
            if let Some(payload) = self
                .endpoint
                .pull_oldest(&self.server, &self.channel)
                .await?
            {
                break payload;
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            sleep(MOBILE_POLL_INTERVAL.min(deadline - now)).await;
        };

        let fields: Map<String, Value> = serde_json::from_slice(&payload)
            .map_err(|e| RelayError::Serialization(e.to_string()))?;
        let event = classify(fields);

        match &event {
            MobileEvent::VerifyPass(_) => self.send(&json!({"id": "success"})).await?,
            MobileEvent::Ping => self.send(&json!({"action": "pong"})).await?,
            MobileEvent::SigningEcho { .. } => {
                self.send(&json!({ PIN_KEY: self.pin.as_str() })).await?
            }
            MobileEvent::RandomNumberEcho(_) => {
                self.send(&json!({"random": "clear"})).await?
            }
            _ => {}
        }
        Ok(Some(event))
    }

    /// Answer `count` desktop messages, each awaited for up to `timeout`.
    ///
    /// Stops early when a message does not arrive in time.
    pub async fn serve(&self, count: usize, timeout: Duration) -> Result<Vec<MobileEvent>> {
        let mut events = Vec::with_capacity(count);
        for _ in 0..count {
            match self.respond(timeout).await? {
                Some(event) => events.push(event),
                None => break,
            }
        }
        Ok(events)
    }
}

fn classify(mut fields: Map<String, Value>) -> MobileEvent {
    let text = |value: Option<&Value>| value.and_then(Value::as_str).map(str::to_string);

    if let Some(verify_pass) = fields.remove("verifypass") {
        return MobileEvent::VerifyPass(verify_pass);
    }
    if let Some(tfa) = text(fields.get("tfa")) {
        return MobileEvent::PairingTest(tfa);
    }
    match fields.get("action").and_then(Value::as_str) {
        Some("ping") => return MobileEvent::Ping,
        Some("clear") => return MobileEvent::Clear,
        _ => {}
    }
    if let Some(echo) = text(fields.get("echo")) {
        if let Some(tx) = text(fields.get("tx")) {
            return MobileEvent::SigningEcho { echo, tx };
        }
        if fields.contains_key("type") {
            return MobileEvent::XpubEcho(echo);
        }
        return MobileEvent::RandomNumberEcho(echo);
    }
    MobileEvent::Unknown(Value::Object(fields))
}
