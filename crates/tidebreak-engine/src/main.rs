//! # Tidebreak
//!
//! Runs one headless island battle and prints its summary as JSON.
//!
//! Usage: `tidebreak [config.toml]` (defaults to `tidebreak.toml`).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use tidebreak_engine::config::CONFIG_FILE;
use tidebreak_engine::{Battle, SimConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("tidebreak=info".parse()?))
        .init();

    info!("Tidebreak starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = SimConfig::load_from(&path);

    let summary = Battle::new(config).run();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Tidebreak shutdown complete");
    Ok(())
}
