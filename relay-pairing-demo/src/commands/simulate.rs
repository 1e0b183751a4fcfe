//! Simulate command - run every protocol step against a simulated mobile
//!
//! The desktop side uses the stored channel (creating one if needed) and an
//! in-process relay; a scripted mobile joins by scanning the pairing payload.

use anyhow::{Context, Result};
use serde_json::json;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use relay_pairing::test_utils::{InMemoryRelay, Side, SimulatedMobile};
use relay_pairing::{Channel, MobileChannel, RelayConfig, RelayServer, SigningPin};

use crate::ui;

/// Messages the desktop sends that the mobile answers or acknowledges.
const DESKTOP_MESSAGES: usize = 7;

pub struct SimulateOptions {
    pub pin: String,
    pub abort: bool,
    pub step_timeout: Duration,
    pub server: Option<String>,
    pub offline: bool,
}

pub async fn run(storage_dir: &Path, options: SimulateOptions, verbose: bool) -> Result<()> {
    let store = super::channel_store(storage_dir);
    let channel = match Channel::load(&store).await {
        Some(channel) => channel,
        None => {
            let channel = Channel::random().context("failed to create channel")?;
            channel
                .save(&store)
                .await
                .context("failed to store channel")?;
            ui::info("No channel stored; created a new one");
            channel
        }
    };

    let server = options.server.map(RelayServer::new).unwrap_or_default();
    let config = RelayConfig::new(server.clone());
    let relay = InMemoryRelay::new();

    ui::section("Simulated Pairing");
    super::print_channel(&channel, &store);
    ui::field("Relay", server.as_str());
    ui::field("Step timeout", &format!("{}s", options.step_timeout.as_secs()));
    ui::rule();

    let pin = if options.abort {
        SigningPin::Abort
    } else {
        SigningPin::Pin(options.pin)
    };
    let mobile = SimulatedMobile::scan(&relay, &channel.pairing_payload()?)?
        .with_server(server)
        .with_pin(pin);

    let step_timeout = options.step_timeout;
    let phone = if options.offline {
        ui::warning("Mobile is offline; the first step will time out");
        None
    } else {
        Some(tokio::spawn(async move {
            mobile.send_public_key().await?;
            mobile.serve(DESKTOP_MESSAGES, step_timeout).await
        }))
    };

    let session = MobileChannel::with_config(channel, relay.endpoint(Side::Desktop), config);

    let ecdh = step(
        "Mobile public key received",
        session.wait_for_mobile_public_key(step_timeout),
    )
    .await?;
    if verbose {
        ui::field("Mobile ECDH key", &ecdh);
    }

    session
        .send_verify_pass(json!({ "ecdh": ecdh, "ciphertext": "demo" }))
        .await?;
    step(
        "Pairing confirmed by mobile",
        session.wait_for_scanning_success(step_timeout),
    )
    .await?;

    session.send_pairing_test("demo-tfa-test").await?;

    session.send_ping().await?;
    step("Mobile answered ping", session.wait_for_pong(step_timeout)).await?;

    session.send_xpub_echo("demo-xpub-echo").await?;

    session
        .send_signing_echo("demo-signing-echo", "demo-transaction")
        .await?;
    let pin = step(
        "Signing answer received",
        session.wait_for_signing_pin(step_timeout),
    )
    .await?;
    if pin.is_abort() {
        ui::warning("Signing was cancelled on the mobile");
    } else {
        ui::field("Signing PIN", pin.as_str());
    }

    session.send_random_number_echo("demo-random-echo").await?;
    step(
        "Random number dismissed on mobile",
        session.wait_for_random_number_clear(step_timeout),
    )
    .await?;

    session.send_clear().await?;

    if let Some(phone) = phone {
        let events = phone.await??;
        if verbose {
            ui::section("Messages seen by the mobile");
            for event in &events {
                println!("  {:?}", event);
            }
        }
    }

    ui::rule();
    ui::field("Messages pushed", &relay.pushes().len().to_string());
    ui::field("Relay pulls", &relay.pull_count().to_string());
    ui::success("All steps completed");
    Ok(())
}

async fn step<T, F>(label: &str, wait: F) -> Result<T>
where
    F: Future<Output = relay_pairing::Result<T>>,
{
    let pb = ui::waiting(label);
    let outcome = wait.await;
    pb.finish_and_clear();
    let value = outcome?;
    ui::success(label);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_pairing::RelayError;

    fn options(offline: bool) -> SimulateOptions {
        SimulateOptions {
            pin: "2468".into(),
            abort: false,
            step_timeout: Duration::from_secs(2),
            server: None,
            offline,
        }
    }

    #[tokio::test]
    async fn test_simulation_completes_and_stores_channel() {
        let dir = tempfile::tempdir().unwrap();

        run(dir.path(), options(false), false).await.unwrap();

        let store = super::super::channel_store(dir.path());
        assert!(Channel::load(&store).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_mobile_times_out() {
        let dir = tempfile::tempdir().unwrap();

        let err = run(dir.path(), options(true), false).await.unwrap_err();

        let relay_err = err.downcast_ref::<RelayError>().unwrap();
        assert!(relay_err.is_timeout());
    }
}
