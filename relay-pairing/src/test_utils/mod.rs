//! Test utilities for relay pairing.
//!
//! Provides an in-memory relay with one FIFO per channel and direction, and a
//! simulated mobile companion that answers the desktop the way the real app
//! does. Together they allow running complete sessions without a network.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_pairing::test_utils::{InMemoryRelay, Side, SimulatedMobile};
//!
//! let relay = InMemoryRelay::new();
//! let channel = Channel::random()?;
//! let mobile = SimulatedMobile::scan(&relay, &channel.pairing_payload()?)?;
//! let desktop = MobileChannel::new(channel, relay.endpoint(Side::Desktop));
//!
//! mobile.send_public_key().await?;
//! let ecdh = desktop.wait_for_mobile_public_key(Duration::from_secs(5)).await?;
//! ```

mod mobile;
mod relay;

pub use mobile::{MobileEvent, SimulatedMobile};
pub use relay::{InMemoryRelay, PushRecord, RelayEndpoint, Side};
