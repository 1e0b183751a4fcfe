mod traits;

pub use traits::RelayTransport;
