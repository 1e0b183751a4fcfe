//! Bounded polling of the relay queue.
//!
//! Every blocking step of the protocol is one call into this module: pull
//! the oldest message until one arrives or the deadline passes, then judge
//! that one message. The relay carries one relevant message per protocol
//! step, so under [`MismatchPolicy::FailFast`] the first unexpected message
//! ends the wait instead of being skipped.
//!
//! Pulls are destructive. Two waits on the same channel at once race for the
//! queue head; [`MobileChannel`](crate::MobileChannel) serializes its waits,
//! callers of the free functions here must do so themselves.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::messages::{decode_fields, ExpectedMessage};
use crate::{Channel, MismatchPolicy, RelayConfig, RelayError, RelayTransport, Result};

/// Longest wait honored; longer durations behave as this one.
const MAX_WAIT: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline `duration` from now, saturated so huge durations cannot overflow.
pub(crate) fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration).unwrap_or(now + MAX_WAIT)
}

/// Verdict on one received payload.
pub(crate) enum Inspection<R> {
    /// The payload is what the step waits for.
    Accept(R),
    /// The payload is not; carries the mismatch error.
    Reject(RelayError),
}

/// Waits up to `duration` for a message equal to `expected`.
///
/// # Errors
/// - `Transport` as soon as a pull fails
/// - `Timeout` if the queue stayed empty until the deadline
/// - `UnexpectedMessage` if a different message arrived (fail-fast policy)
pub async fn wait_for_message<T>(
    transport: &T,
    channel: &Channel,
    config: &RelayConfig,
    duration: Duration,
    expected: &ExpectedMessage,
) -> Result<()>
where
    T: RelayTransport + ?Sized,
{
    let deadline = deadline_after(duration);
    wait_for_message_until(transport, channel, config, deadline, duration, expected).await
}

/// Waits up to `duration` for a message carrying `key` and returns its value.
///
/// Extra fields next to `key` are ignored.
///
/// # Errors
/// - `Transport` as soon as a pull fails
/// - `Timeout` if the queue stayed empty until the deadline
/// - `MissingValue` if a message without `key` arrived (fail-fast policy)
pub async fn wait_for_value<T>(
    transport: &T,
    channel: &Channel,
    config: &RelayConfig,
    duration: Duration,
    key: &str,
) -> Result<String>
where
    T: RelayTransport + ?Sized,
{
    let deadline = deadline_after(duration);
    wait_for_value_until(transport, channel, config, deadline, duration, key).await
}

pub(crate) async fn wait_for_message_until<T>(
    transport: &T,
    channel: &Channel,
    config: &RelayConfig,
    deadline: Instant,
    duration: Duration,
    expected: &ExpectedMessage,
) -> Result<()>
where
    T: RelayTransport + ?Sized,
{
    poll_until(transport, channel, config, deadline, duration, |payload| {
        if expected.matches(payload) {
            Inspection::Accept(())
        } else {
            Inspection::Reject(RelayError::UnexpectedMessage {
                expected: expected.canonical(),
            })
        }
    })
    .await
}

pub(crate) async fn wait_for_value_until<T>(
    transport: &T,
    channel: &Channel,
    config: &RelayConfig,
    deadline: Instant,
    duration: Duration,
    key: &str,
) -> Result<String>
where
    T: RelayTransport + ?Sized,
{
    poll_until(transport, channel, config, deadline, duration, |payload| {
        match decode_fields(payload).and_then(|mut fields| fields.remove(key)) {
            Some(value) => Inspection::Accept(value),
            None => Inspection::Reject(RelayError::MissingValue {
                key: key.to_string(),
            }),
        }
    })
    .await
}

/// Pulls until `inspect` accepts a payload or `deadline` passes.
///
/// Empty pulls are spaced by the configured poll interval, clamped so the
/// final pull happens at the deadline; a timeout is never reported early.
async fn poll_until<T, R, F>(
    transport: &T,
    channel: &Channel,
    config: &RelayConfig,
    deadline: Instant,
    duration: Duration,
    mut inspect: F,
) -> Result<R>
where
    T: RelayTransport + ?Sized,
    F: FnMut(&[u8]) -> Inspection<R>,
{
    let interval = config.poll_interval();

    loop {
        match transport.pull_oldest(&config.server, channel).await? {
            Some(payload) => {
                relay_debug!(
                    "received {} bytes on channel {}",
                    payload.len(),
                    channel.id()
                );
                match inspect(&payload) {
                    Inspection::Accept(value) => return Ok(value),
                    Inspection::Reject(err) => match config.mismatch_policy {
                        MismatchPolicy::FailFast => return Err(err),
                        MismatchPolicy::SkipUntilDeadline => {
                            let _err = err;
                            relay_warn!("discarding unexpected message: {}", _err);
                            if Instant::now() >= deadline {
                                return Err(RelayError::timeout(duration));
                            }
                        }
                    },
                }
            }
            None => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(RelayError::timeout(duration));
                }
                sleep(interval.min(deadline - now)).await;
            }
        }
    }
}
