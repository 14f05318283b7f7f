//! Logging setup.
//!
//! Daemon output goes to the console and, without colors, to an append-only
//! log file. The filter comes from `RUST_LOG` and defaults to `info`.

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::Res;

/// Installs the global subscriber. Creates the log file's directory.
pub fn init(log_file: &Path) -> Res<()> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    Ok(())
}

pub fn banner() {
    info!("╭────────────────────────────────────────╮");
    info!("│                                        │");
    info!("│        spotshuffle v{:<18} │", env!("CARGO_PKG_VERSION"));
    info!("│                                        │");
    info!("╰────────────────────────────────────────╯");
}
