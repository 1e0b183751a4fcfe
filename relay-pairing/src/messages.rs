//! Wire shapes exchanged with the mobile companion app.
//!
//! Field names and literal values here are the compatibility contract with
//! the mobile app and must not change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field carrying the mobile's ECDH public key during pairing.
pub const ECDH_KEY: &str = "ecdh";

/// Field carrying the 2FA signing PIN.
pub const PIN_KEY: &str = "pin";

/// Literal PIN value the mobile sends when the user cancels signing.
pub const ABORT_PIN: &str = "abort";

/// Screen actions understood by the mobile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Liveness request; the mobile answers with `Pong`.
    Ping,
    /// Liveness answer.
    Pong,
    /// Clear the mobile's screen.
    Clear,
}

/// Script type announced with an xpub echo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EchoType {
    /// Pay-to-public-key-hash.
    P2pkh,
}

/// Messages the desktop pushes to the mobile.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// `{"verifypass": <value>}`
    VerifyPass { verifypass: serde_json::Value },
    /// `{"tfa": "<test string>"}`
    PairingTest { tfa: String },
    /// `{"action": "ping" | "pong" | "clear"}`
    Action { action: Action },
    /// `{"echo": "<xpub echo>", "type": "p2pkh"}`
    XpubEcho {
        echo: String,
        #[serde(rename = "type")]
        kind: EchoType,
    },
    /// `{"echo": "<signing echo>", "tx": "<transaction>"}`
    SigningEcho { echo: String, tx: String },
    /// `{"echo": "<random number echo>"}`
    RandomNumberEcho { echo: String },
}

impl OutgoingMessage {
    /// Serialize to the JSON bytes handed to the transport.
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VerifyPass { .. } => "verifypass",
            Self::PairingTest { .. } => "pairing-test",
            Self::Action {
                action: Action::Ping,
            } => "ping",
            Self::Action {
                action: Action::Pong,
            } => "pong",
            Self::Action {
                action: Action::Clear,
            } => "clear",
            Self::XpubEcho { .. } => "xpub-echo",
            Self::SigningEcho { .. } => "signing-echo",
            Self::RandomNumberEcho { .. } => "random-number-echo",
        }
    }
}

/// A message a wait step expects verbatim.
///
/// Comparison is done on the decoded string-to-string map, so key order and
/// whitespace in the received JSON do not matter while every key and value
/// must match exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedMessage(BTreeMap<String, String>);

impl ExpectedMessage {
    /// Build an expected message from key/value pairs.
    pub fn new<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// `{"id": "success"}`: the mobile finished scanning the pairing code.
    pub fn scanning_success() -> Self {
        Self::new([("id", "success")])
    }

    /// `{"action": "pong"}`: answer to a ping.
    pub fn pong() -> Self {
        Self::new([("action", "pong")])
    }

    /// `{"random": "clear"}`: the user dismissed the random number prompt.
    pub fn random_number_clear() -> Self {
        Self::new([("random", "clear")])
    }

    /// Returns true if `payload` decodes to exactly this message.
    pub fn matches(&self, payload: &[u8]) -> bool {
        decode_fields(payload).is_some_and(|fields| fields == self.0)
    }

    /// Canonical JSON rendering, used in error messages.
    pub fn canonical(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// Decode a payload as a flat string-to-string JSON object.
///
/// Returns None for anything else, including objects with non-string values.
pub fn decode_fields(payload: &[u8]) -> Option<BTreeMap<String, String>> {
    serde_json::from_slice(payload).ok()
}

/// Outcome of the 2FA signing confirmation on the mobile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SigningPin {
    /// The user confirmed and the mobile returned this PIN.
    Pin(String),
    /// The user cancelled on the mobile.
    Abort,
}

impl SigningPin {
    /// Returns true if the user cancelled.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Abort)
    }

    /// The value as sent on the wire (`"abort"` for a cancellation).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pin(pin) => pin,
            Self::Abort => ABORT_PIN,
        }
    }
}

impl From<String> for SigningPin {
    fn from(value: String) -> Self {
        if value == ABORT_PIN {
            Self::Abort
        } else {
            Self::Pin(value)
        }
    }
}

impl std::fmt::Display for SigningPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
