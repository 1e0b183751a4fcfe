//! New command - create and persist a fresh channel

use anyhow::{Context, Result};
use std::path::Path;

use relay_pairing::Channel;

use crate::ui;

pub async fn run(storage_dir: &Path, force: bool, verbose: bool) -> Result<()> {
    let store = super::channel_store(storage_dir);

    if let Some(existing) = Channel::load(&store).await {
        ui::warning(&format!("A channel is already stored: {}", existing.id()));
        if !force && !ui::confirm("Replace it? The mobile will have to pair again", false)? {
            ui::info("Keeping the existing channel");
            return Ok(());
        }
    }

    let channel = Channel::random().context("failed to create channel")?;
    channel
        .save(&store)
        .await
        .context("failed to store channel")?;
    tracing::info!("created channel {}", channel.id());

    ui::success("New channel created");
    super::print_channel(&channel, &store);
    if verbose {
        ui::field("Relay", relay_pairing::DEFAULT_RELAY_SERVER);
    }

    ui::section("Pairing code");
    ui::pairing_code(&channel.pairing_payload()?, false)?;
    Ok(())
}
