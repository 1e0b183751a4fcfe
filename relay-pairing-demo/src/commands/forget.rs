//! Forget command - remove the stored channel

use anyhow::{Context, Result};
use std::path::Path;

use relay_pairing::Channel;

use crate::ui;

pub async fn run(storage_dir: &Path, yes: bool, _verbose: bool) -> Result<()> {
    let store = super::channel_store(storage_dir);

    let Some(channel) = Channel::load(&store).await else {
        ui::info("No channel stored");
        return Ok(());
    };

    if !yes && !ui::confirm(&format!("Forget channel {}?", channel.id()), false)? {
        ui::info("Cancelled");
        return Ok(());
    }

    Channel::forget(&store)
        .await
        .context("failed to remove channel")?;
    tracing::info!("forgot channel {}", channel.id());
    ui::success("Channel forgotten; the next start pairs afresh");
    Ok(())
}
