//! Relay pairing library.
//!
//! Implements the encrypted pairing and confirmation protocol between a
//! hardware wallet's desktop app and its mobile companion. The two sides
//! never talk directly: every message goes through an untrusted
//! store-and-forward relay, addressed by a random channel identifier and
//! encrypted with a channel key only the two sides know.
//!
//! The relay transport and channel persistence are injected through the
//! [`RelayTransport`] and [`storage::ChannelStore`] traits.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use relay_pairing::{Channel, MobileChannel, storage::FileChannelStore};
//!
//! let store = FileChannelStore::in_dir(config_dir);
//! let channel = match Channel::load(&store).await {
//!     Some(channel) => channel,
//!     None => Channel::random()?,
//! };
//! show_qr_code(&channel.pairing_payload()?);
//!
//! let mobile = MobileChannel::new(channel, transport);
//! let ecdh = mobile.wait_for_mobile_public_key(Duration::from_secs(60)).await?;
//! mobile.send_verify_pass(derive_verify_pass(&ecdh)).await?;
//! mobile.wait_for_scanning_success(Duration::from_secs(60)).await?;
//! mobile.channel().save(&store).await?;
//! ```

macro_rules! relay_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

macro_rules! relay_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::warn!($($arg)*);
    };
}

pub mod channel;
pub mod config;
pub mod errors;
pub mod messages;
pub mod poll;
mod session;
pub mod storage;
mod transport;

/// In-memory relay and simulated mobile for tests and demos.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use channel::{Channel, ChannelKey, ChannelRecord};
pub use config::{MismatchPolicy, RelayConfig, RelayServer, DEFAULT_RELAY_SERVER};
pub use errors::{RelayError, RelayErrorCode};
pub use messages::{ExpectedMessage, OutgoingMessage, SigningPin};
pub use session::MobileChannel;
pub use transport::RelayTransport;

/// Common result alias for relay pairing operations.
pub type Result<T> = std::result::Result<T, RelayError>;
