//! Last.fm Scrobbler CLI Library
//!
//! This library provides the pieces of a command-line scrobbler: it signs and
//! submits play events to the Last.fm web service, keeps the Last.fm session key
//! obtained through the browser handshake, and reads track listings from
//! Spotify playlists.
//!
//! # Modules
//!
//! - `api` - HTTP handler for the local callback listener
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration loading from the environment and `.env` files
//! - `lastfm` - Last.fm request signing, authentication and scrobbling
//! - `management` - Persisted session and token caches
//! - `server` - One-shot local HTTP server for browser redirects
//! - `spotify` - Spotify playlist reader and its authorization
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use scrobblecli::{config, lastfm::LastfmClient};
//!
//! #[tokio::main]
//! async fn main() -> scrobblecli::Res<()> {
//!     config::load_env().await;
//!     let client = LastfmClient::new(config::LastfmConfig::from_env()?);
//!     let plays = client.scrobble_count("someone").await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod lastfm;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Result alias used across the crate.
///
/// Errors are boxed so that HTTP, I/O, JSON and the crate's own error enums
/// can all flow through `?` while staying `Send + Sync` for tokio tasks.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a status line prefixed with a blue `o`.
///
/// Accepts the same arguments as `println!`.
///
/// # Example
///
/// ```
/// info!("Preparing to scrobble {} track(s)", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a line prefixed with a green checkmark for completed steps.
///
/// # Example
///
/// ```
/// success!("Authenticated as {}", name);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line and terminates the process with exit status 1.
///
/// Only for conditions the run cannot continue from: missing configuration,
/// a failed Last.fm handshake, or a transport failure mid-run. Because it
/// diverges, it can be used as the value of a `match` arm.
///
/// # Example
///
/// ```
/// let cfg = match LastfmConfig::from_env() {
///     Ok(cfg) => cfg,
///     Err(e) => error!("{}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a yellow `!` line for recoverable problems and informational
/// outcomes such as ignored scrobbles.
///
/// # Example
///
/// ```
/// warning!("Track {} was ignored: {}", index, message);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
