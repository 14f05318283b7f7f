//! # CLI Module
//!
//! The commands of the `spotshuffle` binary.
//!
//! - [`run`] - the long-running poller (default command)
//! - [`auth`] - interactive authorization only, caches the token and exits
//! - [`pairs`] - shows the configured pairs with resolved playlist names
//!
//! `run` reports through `tracing` (console and log file). `auth` and
//! `pairs` are interactive and print with the colored console macros.
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotshuffle auth     # once, on a machine with a browser
//! spotshuffle pairs    # check the configuration
//! spotshuffle          # start polling
//! ```

mod auth;
mod pairs;
mod run;

pub use auth::auth;
pub use pairs::pairs;
pub use run::run;

use crate::{config::Settings, error};

/// Reads the configuration or exits with a message.
fn load_settings() -> Settings {
    match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    }
}
