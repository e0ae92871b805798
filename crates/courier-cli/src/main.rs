//! Courier maintenance CLI.
//!
//! ```bash
//! courier encode "/Photos/2024/Summer trip"
//! courier decode yd_open_h:be560526 --chat 123456789
//! courier sessions purge
//! ```

mod cli;
mod commands;

use clap::Parser;
use courier_core::{config, Settings};
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let state_dir = cli.state_dir();
    config::load_env_from(&state_dir);

    let filter = match cli.verbose {
        0 => "courier=warn,courier_telegram=warn",
        1 => "courier=info,courier_core=info,courier_persistence=info,courier_telegram=info",
        2 => "courier=debug,courier_core=debug,courier_persistence=debug,courier_telegram=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = config::ensure_dirs_in(&state_dir) {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let settings = Settings::from_env();
    commands::run(cli.command, &state_dir, &settings).await
}
