//! Reset the reminded-events cache
//!
//! Overwrites the marker file with an empty array so every reminder is
//! eligible again on the next tick. The file is found the same way the relay
//! finds it: `REMINDED_EVENTS_PATH` from the environment, then from the
//! `CONFIG_PATH` JSON file. `--path` overrides both.
//!
//! Usage: cargo run --bin clear-cache -- [--path data/reminded_events.json]

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use log::info;
use std::path::PathBuf;

use reminder_relay::core::config::{load_config_file, marker_path_from_sources};
use reminder_relay::features::markers::{JsonMarkerFile, MarkerStore};

#[derive(Parser)]
#[command(name = "clear-cache")]
#[command(about = "Forget which reminders have been sent so they can fire again")]
struct Cli {
    /// Marker file to reset instead of the configured one
    #[arg(short, long)]
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let path = match cli.path {
        Some(path) => path,
        None => {
            let file = load_config_file()?;
            marker_path_from_sources(&file, |key| std::env::var(key).ok())
                .context("No marker file configured; pass --path")?
        }
    };

    let store = JsonMarkerFile::new(path);
    store.reset()?;

    info!("Marker file {} reset to an empty array", store.path().display());
    Ok(())
}
