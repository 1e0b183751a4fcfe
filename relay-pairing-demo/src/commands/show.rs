//! Show command - display the stored channel

use anyhow::Result;
use std::path::Path;

use relay_pairing::Channel;

use crate::ui;

pub async fn run(storage_dir: &Path, raw: bool, _verbose: bool) -> Result<()> {
    let store = super::channel_store(storage_dir);

    match Channel::load(&store).await {
        Some(channel) => {
            ui::section("Paired Channel");
            super::print_channel(&channel, &store);

            ui::pairing_code(&channel.pairing_payload()?, raw)?;
        }
        None => {
            ui::error("No channel stored");
            ui::info("Run 'relay-pairing-demo new' to create one");
        }
    }

    Ok(())
}
