//! Relay endpoint selection and polling behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Relay endpoint used when nothing else is configured.
pub const DEFAULT_RELAY_SERVER: &str = "https://digitalbitbox.com/smartverification/index.php";

/// A relay endpoint.
///
/// The core never talks to the network itself; the server is handed to the
/// transport on every call so it can be swapped per region, per test or by
/// user settings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayServer(pub String);

impl RelayServer {
    /// Create a relay server from its URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Get the URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RelayServer {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_SERVER)
    }
}

impl std::fmt::Display for RelayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a wait does when it receives a message it did not ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Abort the wait with a protocol mismatch error on the first unexpected message.
    #[default]
    FailFast,
    /// Discard unexpected messages and keep polling until the deadline.
    SkipUntilDeadline,
}

/// Configuration shared by every operation on a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay endpoint.
    #[serde(default)]
    pub server: RelayServer,

    /// Delay between two pulls that found the queue empty, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Handling of unexpected messages during a wait.
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
}

fn default_poll_interval_ms() -> u64 {
    300
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: RelayServer::default(),
            poll_interval_ms: default_poll_interval_ms(),
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

impl RelayConfig {
    /// Create a configuration for the given relay server.
    pub fn new(server: RelayServer) -> Self {
        Self {
            server,
            ..Self::default()
        }
    }

    /// Set the delay between empty pulls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the mismatch policy.
    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    /// Delay between empty pulls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.server.as_str(), DEFAULT_RELAY_SERVER);
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
        assert_eq!(config.mismatch_policy, MismatchPolicy::FailFast);
    }

    #[test]
    fn test_builder() {
        let config = RelayConfig::new(RelayServer::new("http://127.0.0.1:8080/relay"))
            .with_poll_interval(Duration::from_millis(50))
            .with_mismatch_policy(MismatchPolicy::SkipUntilDeadline);

        assert_eq!(config.server.to_string(), "http://127.0.0.1:8080/relay");
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.mismatch_policy, MismatchPolicy::SkipUntilDeadline);
    }

    #[test]
    fn test_huge_poll_interval_saturates() {
        let config = RelayConfig::default().with_poll_interval(Duration::MAX);
        assert_eq!(config.poll_interval_ms, u64::MAX);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RelayConfig =
            serde_json::from_str(r#"{"mismatch_policy":"skip_until_deadline"}"#).unwrap();
        assert_eq!(config.server, RelayServer::default());
        assert_eq!(config.poll_interval_ms, 300);
        assert_eq!(config.mismatch_policy, MismatchPolicy::SkipUntilDeadline);
    }
}
