//! Terminal output for the demo

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Width of field labels, so values line up.
const LABEL_WIDTH: usize = 16;

/// Print a step that went through
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a failure to stderr
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a neutral note
pub fn info(message: &str) {
    println!("{} {}", "·".blue().bold(), message);
}

/// Print something the user should notice
pub fn warning(message: &str) {
    println!("{} {}", "!".yellow().bold(), message);
}

/// Start a titled section
pub fn section(title: &str) {
    println!("\n{}", title.bold());
    rule();
}

/// Print one labelled value, aligned with its neighbours
pub fn field(label: &str, value: &str) {
    let label = format!("{:<width$}", label, width = LABEL_WIDTH);
    println!("  {} {}", label.dimmed(), value);
}

/// Thin horizontal rule
pub fn rule() {
    println!("{}", "─".repeat(48).dimmed());
}

/// Spinner shown while a step waits on the mobile
pub fn waiting(step: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} waiting: {msg}") {
        pb.set_style(style);
    }
    pb.set_message(step.to_lowercase());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Ask a yes/no question
pub fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    use dialoguer::Confirm;
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Show the pairing payload for the mobile to scan.
///
/// `raw` prints the JSON instead of a QR code; it carries the channel key, so
/// a warning goes with it.
pub fn pairing_code(payload: &str, raw: bool) -> anyhow::Result<()> {
    if raw {
        warning("The pairing payload contains the channel key; do not share it");
        let value: serde_json::Value = serde_json::from_str(payload)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let code = qrcode::QrCode::new(payload)?;
    let rendered = code
        .render::<char>()
        .quiet_zone(true)
        .module_dimensions(2, 1)
        .build();
    println!("\n{}\n", rendered);
    info("Scan this code with the mobile app");
    Ok(())
}
