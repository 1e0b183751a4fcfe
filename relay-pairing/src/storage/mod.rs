//! Persistence adapters for the paired channel.
//!
//! The channel is stored as one small JSON record. Adapters only move bytes;
//! parsing and validation live in [`Channel::load`](crate::Channel::load),
//! which treats anything unreadable as "not paired".
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_pairing::{Channel, storage::FileChannelStore};
//!
//! let store = FileChannelStore::in_dir("/home/user/.config/relay-pairing");
//! let channel = match Channel::load(&store).await {
//!     Some(channel) => channel,
//!     None => {
//!         let channel = Channel::random()?;
//!         channel.save(&store).await?;
//!         channel
//!     }
//! };
//! ```

mod file;
mod memory;
mod traits;

pub use file::{FileChannelStore, CHANNEL_FILE_NAME};
pub use memory::InMemoryChannelStore;
pub use traits::ChannelStore;
