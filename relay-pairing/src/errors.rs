//! Error types for relay pairing operations.
//!
//! Every catalog operation fails in exactly one of three ways: the relay
//! could not be reached, the paired mobile did not answer in time, or it
//! answered with something the current step did not expect. The variants
//! below keep those cases apart so callers can react differently.

/// Error codes for FFI and UI integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RelayErrorCode {
    /// Secure random source unavailable
    Randomness = 1000,
    /// Relay push or pull failed
    Transport = 2000,
    /// No response from the mobile before the deadline
    Timeout = 2001,
    /// Received a message other than the expected one
    UnexpectedMessage = 3000,
    /// Received a message lacking the expected value
    MissingValue = 3001,
    /// Persisted channel could not be written or removed
    Persistence = 4000,
    /// Channel identifier or key is malformed
    InvalidChannel = 4001,
    /// Serialization error
    Serialization = 5000,
}

/// Errors raised while pairing with or talking to the mobile.
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    /// The OS random number generator failed while creating a channel.
    #[error("secure randomness unavailable: {0}")]
    Randomness(String),

    /// Push or pull failed at the relay layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Nothing arrived from the mobile within the allotted time.
    #[error("did not receive a response from the mobile within {timeout_ms}ms")]
    Timeout {
        /// The wait duration in milliseconds
        timeout_ms: u64,
    },

    /// A message arrived but it was not the one the step waits for.
    #[error("received a different message from the paired mobile than expected ({expected})")]
    UnexpectedMessage {
        /// Canonical form of the expected message
        expected: String,
    },

    /// A message arrived but did not carry the requested value.
    #[error("did not receive the value '{key}' from the paired mobile")]
    MissingValue {
        /// Name of the missing field
        key: String,
    },

    /// Writing or removing the persisted channel failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A supplied or restored channel is structurally invalid.
    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RelayError {
    /// Get the error code for FFI/UI integration.
    pub fn code(&self) -> RelayErrorCode {
        match self {
            Self::Randomness(_) => RelayErrorCode::Randomness,
            Self::Transport(_) => RelayErrorCode::Transport,
            Self::Timeout { .. } => RelayErrorCode::Timeout,
            Self::UnexpectedMessage { .. } => RelayErrorCode::UnexpectedMessage,
            Self::MissingValue { .. } => RelayErrorCode::MissingValue,
            Self::Persistence(_) => RelayErrorCode::Persistence,
            Self::InvalidChannel(_) => RelayErrorCode::InvalidChannel,
            Self::Serialization(_) => RelayErrorCode::Serialization,
        }
    }

    /// Create a transport error from any error type.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }

    /// Create a timeout error for the given wait duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Returns true if the mobile did not answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the relay itself failed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if the mobile answered with something the step did not expect.
    ///
    /// Treat this as a possible desync or a tampering relay; re-pairing is the
    /// usual way out.
    pub fn is_protocol_mismatch(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedMessage { .. } | Self::MissingValue { .. }
        )
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Could not reach the relay server.",
            Self::Timeout { .. } => "No response from the paired mobile.",
            Self::UnexpectedMessage { .. } | Self::MissingValue { .. } => {
                "Pairing with the mobile failed. Please pair again."
            }
            Self::Randomness(_) => "The system random number generator is unavailable.",
            Self::Persistence(_) | Self::InvalidChannel(_) | Self::Serialization(_) => {
                "The pairing information could not be processed."
            }
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
