//! Spotify playlist shuffle helper library.
//!
//! Watches what the account is playing and, when the track plays from a
//! configured source playlist, moves it to the paired target playlist.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local authorization server
//! - `cli` - Command implementations
//! - `config` - Configuration from environment variables and `.env` files
//! - `error` - Error types
//! - `logging` - Console and log file output
//! - `management` - Token cache file and playlist cache
//! - `playback` - Playback observer with bounded retries
//! - `poller` - The poll loop
//! - `relocation` - Moving a track between playlists
//! - `server` - Local HTTP server for the OAuth callback
//! - `spotify` - Spotify Web API client and OAuth flow
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE and other helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod management;
pub mod playback;
pub mod poller;
pub mod relocation;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for the command layer.
///
/// Uses a boxed dynamic error so setup code can mix I/O, configuration and
/// subscriber errors with `?`.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Open {} to authorize", url);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Token cached at {}", path.display());
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors, such as an invalid configuration at startup.
/// Code after this macro does not run.
///
/// # Example
///
/// ```
/// error!("Invalid configuration: {}", e);
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Failed to open browser, visit {} manually", url);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
