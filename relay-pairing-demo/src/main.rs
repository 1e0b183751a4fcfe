//! Relay Pairing Demo CLI
//!
//! Creates, inspects and forgets the persisted pairing channel, and runs the
//! pairing and confirmation exchanges against a simulated mobile.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod ui;

#[derive(Parser)]
#[command(name = "relay-pairing-demo")]
#[command(about = "Relay Pairing Demo CLI - pair a desktop with a mobile over a relay", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Custom storage directory (can also be set via RELAY_PAIRING_DIR env var)
    #[arg(long, global = true)]
    storage_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new channel and show its pairing code
    New {
        /// Replace an existing channel without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Show the persisted channel and its pairing code
    Show {
        /// Print the pairing payload instead of a QR code
        #[arg(long)]
        raw: bool,
    },

    /// Forget the persisted channel
    Forget {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Run pairing and every confirmation step against a simulated mobile
    Simulate {
        /// PIN the simulated mobile answers the signing echo with
        #[arg(long, default_value = "1234", conflicts_with = "abort")]
        pin: String,

        /// Make the simulated mobile cancel the signing instead
        #[arg(long)]
        abort: bool,

        /// Timeout for each step, in seconds
        #[arg(long, default_value = "10")]
        timeout_secs: u64,

        /// Relay server URL
        #[arg(long)]
        server: Option<String>,

        /// Leave the mobile silent to watch a step time out
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "relay_pairing_demo=debug,relay_pairing=debug"
    } else {
        "relay_pairing_demo=info,relay_pairing=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let storage_dir = commands::resolve_storage_dir(cli.storage_dir.as_deref());
    tracing::debug!("using storage directory {}", storage_dir.display());

    let outcome = match cli.command {
        Commands::New { force } => commands::new::run(&storage_dir, force, cli.verbose).await,
        Commands::Show { raw } => commands::show::run(&storage_dir, raw, cli.verbose).await,
        Commands::Forget { yes } => commands::forget::run(&storage_dir, yes, cli.verbose).await,
        Commands::Simulate {
            pin,
            abort,
            timeout_secs,
            server,
            offline,
        } => {
            let options = commands::simulate::SimulateOptions {
                pin,
                abort,
                step_timeout: std::time::Duration::from_secs(timeout_secs),
                server,
                offline,
            };
            commands::simulate::run(&storage_dir, options, cli.verbose).await
        }
    };

    if let Err(err) = outcome {
        match err.downcast_ref::<relay_pairing::RelayError>() {
            Some(relay_err) => {
                ui::error(relay_err.user_message());
                ui::field("Details", &relay_err.to_string());
            }
            None => ui::error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }

    Ok(())
}
