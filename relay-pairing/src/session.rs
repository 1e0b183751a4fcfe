//! Pairing and command exchanges with the paired mobile.
//!
//! [`MobileChannel`] bundles a [`Channel`], a relay transport and the relay
//! configuration, and exposes each protocol step as one method. Sequencing
//! is up to the caller. Pairing runs
//!
//! 1. [`wait_for_mobile_public_key`](MobileChannel::wait_for_mobile_public_key)
//! 2. [`send_verify_pass`](MobileChannel::send_verify_pass)
//! 3. [`wait_for_scanning_success`](MobileChannel::wait_for_scanning_success)
//!
//! after which ping/pong, echo and signing confirmation steps may be used
//! in any order. A failed step leaves the session as it was; retrying or
//! abandoning it is the caller's decision.

use std::time::Duration;

use tokio::time::Instant;

use crate::messages::{
    Action, EchoType, ExpectedMessage, OutgoingMessage, SigningPin, ECDH_KEY, PIN_KEY,
};
use crate::poll::{deadline_after, wait_for_message_until, wait_for_value_until};
use crate::{Channel, RelayConfig, RelayError, RelayTransport, Result};

/// A channel to the paired mobile over a relay.
///
/// Waits on one `MobileChannel`, or on sessions built from clones of the same
/// [`Channel`], are serialized: a second wait blocks until the first
/// finishes, and gives up with `Timeout` if its own deadline passes first.
/// Sends are never blocked.
pub struct MobileChannel<T> {
    channel: Channel,
    transport: T,
    config: RelayConfig,
}

impl<T: RelayTransport> MobileChannel<T> {
    /// Create a session using the default relay configuration.
    pub fn new(channel: Channel, transport: T) -> Self {
        Self::with_config(channel, transport, RelayConfig::default())
    }

    /// Create a session with an explicit relay configuration.
    pub fn with_config(channel: Channel, transport: T, config: RelayConfig) -> Self {
        Self {
            channel,
            transport,
            config,
        }
    }

    /// The channel this session uses.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The relay configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Push one message to the mobile.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(channel = %self.channel.id(), message = message.label())))]
    pub async fn push(&self, message: &OutgoingMessage) -> Result<()> {
        let payload = message.to_bytes()?;
        self.transport
            .push(&self.config.server, &self.channel, &payload)
            .await
    }

    /// Wait up to `duration` for exactly `expected`.
    pub async fn wait_for_message(
        &self,
        duration: Duration,
        expected: &ExpectedMessage,
    ) -> Result<()> {
        let deadline = deadline_after(duration);
        let _reader = self.acquire_reader(deadline, duration).await?;
        wait_for_message_until(
            &self.transport,
            &self.channel,
            &self.config,
            deadline,
            duration,
            expected,
        )
        .await
    }

    /// Wait up to `duration` for a message carrying `key`; returns its value.
    pub async fn wait_for_value(&self, duration: Duration, key: &str) -> Result<String> {
        let deadline = deadline_after(duration);
        let _reader = self.acquire_reader(deadline, duration).await?;
        wait_for_value_until(
            &self.transport,
            &self.channel,
            &self.config,
            deadline,
            duration,
            key,
        )
        .await
    }

    async fn acquire_reader(
        &self,
        deadline: Instant,
        duration: Duration,
    ) -> Result<tokio::sync::MutexGuard<'_, ()>> {
        tokio::time::timeout_at(deadline, self.channel.reader().lock())
            .await
            .map_err(|_| RelayError::timeout(duration))
    }

    /// Wait for the mobile's ECDH public key, sent after it scanned the pairing code.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(channel = %self.channel.id())))]
    pub async fn wait_for_mobile_public_key(&self, duration: Duration) -> Result<String> {
        self.wait_for_value(duration, ECDH_KEY).await
    }

    /// Send the verification value derived from the agreed key to finish pairing.
    pub async fn send_verify_pass(&self, verify_pass: serde_json::Value) -> Result<()> {
        self.push(&OutgoingMessage::VerifyPass {
            verifypass: verify_pass,
        })
        .await
    }

    /// Wait for the mobile to confirm the pairing scan.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(channel = %self.channel.id())))]
    pub async fn wait_for_scanning_success(&self, duration: Duration) -> Result<()> {
        self.wait_for_message(duration, &ExpectedMessage::scanning_success())
            .await
    }

    /// Send the encrypted test string the mobile displays so the user can
    /// confirm the pairing visually.
    pub async fn send_pairing_test(&self, tfa_test_string: &str) -> Result<()> {
        self.push(&OutgoingMessage::PairingTest {
            tfa: tfa_test_string.to_string(),
        })
        .await
    }

    /// Send a ping; a listening mobile answers with pong.
    pub async fn send_ping(&self) -> Result<()> {
        self.push(&OutgoingMessage::Action {
            action: Action::Ping,
        })
        .await
    }

    /// Wait for the pong answering a ping.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(channel = %self.channel.id())))]
    pub async fn wait_for_pong(&self, duration: Duration) -> Result<()> {
        self.wait_for_message(duration, &ExpectedMessage::pong())
            .await
    }

    /// Clear the mobile's screen.
    pub async fn send_clear(&self) -> Result<()> {
        self.push(&OutgoingMessage::Action {
            action: Action::Clear,
        })
        .await
    }

    /// Send the encrypted xpub echo for out-of-band confirmation on the mobile.
    pub async fn send_xpub_echo(&self, xpub_echo: &str) -> Result<()> {
        self.push(&OutgoingMessage::XpubEcho {
            echo: xpub_echo.to_string(),
            kind: EchoType::P2pkh,
        })
        .await
    }

    /// Send the encrypted signing echo and transaction summary.
    pub async fn send_signing_echo(&self, signing_echo: &str, transaction: &str) -> Result<()> {
        self.push(&OutgoingMessage::SigningEcho {
            echo: signing_echo.to_string(),
            tx: transaction.to_string(),
        })
        .await
    }

    /// Wait for the 2FA signing PIN, or the user's cancellation.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(channel = %self.channel.id())))]
    pub async fn wait_for_signing_pin(&self, duration: Duration) -> Result<SigningPin> {
        self.wait_for_value(duration, PIN_KEY)
            .await
            .map(SigningPin::from)
    }

    /// Send the encrypted random number echo for numeric comparison.
    pub async fn send_random_number_echo(&self, random_number_echo: &str) -> Result<()> {
        self.push(&OutgoingMessage::RandomNumberEcho {
            echo: random_number_echo.to_string(),
        })
        .await
    }

    /// Wait for the user to dismiss the random number prompt.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(channel = %self.channel.id())))]
    pub async fn wait_for_random_number_clear(&self, duration: Duration) -> Result<()> {
        self.wait_for_message(duration, &ExpectedMessage::random_number_clear())
            .await
    }
}

impl<T> std::fmt::Debug for MobileChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobileChannel")
            .field("channel", &self.channel)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
