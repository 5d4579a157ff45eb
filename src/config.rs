//! Configuration management for the scrobbler.
//!
//! Values come from environment variables, optionally seeded from `.env`
//! files. They are read exactly once, into [`LastfmConfig`] and
//! [`SpotifyConfig`], and those structs are handed to the components that need
//! them. Nothing else in the crate touches the environment.
//!
//! Lookup order for `.env` files:
//! 1. `<local data dir>/scrobblecli/.env`
//! 2. `.env` in the current working directory
//!
//! Variables already present in the process environment always win.

use std::{env, fmt, io, path::PathBuf, str::FromStr, time::Duration};

use crate::warning;

pub const LASTFM_API_URL: &str = "https://ws.audioscrobbler.com/2.0/";
pub const LASTFM_AUTH_URL: &str = "https://www.last.fm/api/auth/";
pub const LASTFM_CALLBACK_PORT: u16 = 8080;
pub const LASTFM_SESSION_FILE: &str = "lastfm_session.json";
pub const AUTH_TIMEOUT_SECS: u64 = 120;

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const SPOTIFY_API_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const SPOTIFY_API_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const SPOTIFY_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const SPOTIFY_SCOPE: &str = "playlist-read-private";

/// Problems found while building a config struct from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(
                f,
                "{var} must be set (in the environment or a .env file)"
            ),
            ConfigError::Invalid { var, value } => {
                write!(f, "{var} has an invalid value: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Loads `.env` files from the local data directory and the working directory.
///
/// Both files are optional. Variables set by the first file are not
/// overwritten by the second, and neither overrides the process environment.
/// The required variables are validated later by the `from_env` constructors.
///
/// # Directory Structure
///
/// The data directory file is looked up in:
/// - Linux: `~/.local/share/scrobblecli/.env`
/// - macOS: `~/Library/Application Support/scrobblecli/.env`
/// - Windows: `%LOCALAPPDATA%/scrobblecli/.env`
///
/// # Errors
///
/// Never fails. A file that exists but cannot be read or parsed is reported
/// with `warning!` and skipped.
///
/// # Example
///
/// ```
/// use scrobblecli::config;
///
/// #[tokio::main]
/// async fn main() {
///     config::load_env().await;
///     let lastfm = config::LastfmConfig::from_env();
/// }
/// ```
pub async fn load_env() {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("scrobblecli/.env");

    if let Err(e) = dotenv::from_path(&path) {
        report_env_file_error(&path.display().to_string(), e);
    }
    if let Err(e) = dotenv::dotenv() {
        report_env_file_error(".env", e);
    }
}

fn report_env_file_error(file: &str, err: dotenv::Error) {
    if let Some(reason) = env_file_problem(&err) {
        warning!("Ignoring {}: {}", file, reason);
    }
}

/// Describes a `.env` loading failure worth telling the user about.
///
/// Returns `None` when the file simply does not exist.
fn env_file_problem(err: &dotenv::Error) -> Option<String> {
    match err {
        dotenv::Error::Io(e) if e.kind() == io::ErrorKind::NotFound => None,
        other => Some(other.to_string()),
    }
}

/// Settings for talking to Last.fm.
#[derive(Debug, Clone)]
pub struct LastfmConfig {
    pub api_key: String,
    pub shared_secret: String,
    pub api_url: String,
    pub auth_url: String,
    pub callback_port: u16,
    pub auth_timeout: Duration,
    pub session_file: PathBuf,
}

impl LastfmConfig {
    /// Builds the Last.fm settings from the process environment.
    ///
    /// # Variables
    ///
    /// * `LASTFM_API_KEY` - API key of the registered application (required)
    /// * `LASTFM_SHARED_SECRET` - shared secret used for request signatures (required)
    /// * `LASTFM_API_URL` - web service endpoint, defaults to [`LASTFM_API_URL`]
    /// * `LASTFM_AUTH_URL` - browser authorization page, defaults to [`LASTFM_AUTH_URL`]
    /// * `LASTFM_CALLBACK_PORT` - local port for the token redirect, defaults to 8080
    /// * `LASTFM_AUTH_TIMEOUT_SECS` - how long to wait for the browser, defaults to 120
    /// * `LASTFM_SESSION_FILE` - where the session is stored, defaults to
    ///   `lastfm_session.json` in the working directory
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when a required variable is unset and
    /// [`ConfigError::Invalid`] when a numeric variable does not parse.
    ///
    /// # Example
    ///
    /// ```
    /// let config = LastfmConfig::from_env()?;
    /// println!("callback at {}", config.callback_url()); // http://127.0.0.1:8080
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) but with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: required(&lookup, "LASTFM_API_KEY")?,
            shared_secret: required(&lookup, "LASTFM_SHARED_SECRET")?,
            api_url: optional(&lookup, "LASTFM_API_URL").unwrap_or_else(|| LASTFM_API_URL.into()),
            auth_url: optional(&lookup, "LASTFM_AUTH_URL")
                .unwrap_or_else(|| LASTFM_AUTH_URL.into()),
            callback_port: parsed(&lookup, "LASTFM_CALLBACK_PORT")?
                .unwrap_or(LASTFM_CALLBACK_PORT),
            auth_timeout: Duration::from_secs(
                parsed(&lookup, "LASTFM_AUTH_TIMEOUT_SECS")?.unwrap_or(AUTH_TIMEOUT_SECS),
            ),
            session_file: optional(&lookup, "LASTFM_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(LASTFM_SESSION_FILE)),
        })
    }

    /// Address the local callback listener binds to.
    pub fn callback_addr(&self) -> String {
        format!("127.0.0.1:{}", self.callback_port)
    }

    /// URL Last.fm redirects the browser to once the user grants access.
    pub fn callback_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.callback_port)
    }
}

/// Settings for the Spotify playlist reader.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub auth_timeout: Duration,
}

impl SpotifyConfig {
    /// Builds the Spotify settings from the process environment.
    ///
    /// The credential names match the ones spotipy uses so an existing `.env`
    /// keeps working.
    ///
    /// # Variables
    ///
    /// * `SPOTIPY_CLIENT_ID` - client id of the Spotify application (required)
    /// * `SPOTIPY_REDIRECT_URI` - registered redirect, defaults to
    ///   `http://127.0.0.1:8888/callback`; the local listener binds its host and port
    /// * `SPOTIFY_API_AUTH_SCOPE` - requested scope, defaults to `playlist-read-private`
    /// * `SPOTIFY_API_URL`, `SPOTIFY_API_AUTH_URL`, `SPOTIFY_API_TOKEN_URL` -
    ///   endpoint overrides
    /// * `SPOTIFY_AUTH_TIMEOUT_SECS` - how long to wait for the browser, defaults to 120
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] without a client id and
    /// [`ConfigError::Invalid`] when the timeout does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            client_id: required(&lookup, "SPOTIPY_CLIENT_ID")?,
            redirect_uri: optional(&lookup, "SPOTIPY_REDIRECT_URI")
                .unwrap_or_else(|| SPOTIFY_REDIRECT_URI.into()),
            scope: optional(&lookup, "SPOTIFY_API_AUTH_SCOPE")
                .unwrap_or_else(|| SPOTIFY_SCOPE.into()),
            api_url: optional(&lookup, "SPOTIFY_API_URL")
                .unwrap_or_else(|| SPOTIFY_API_URL.into()),
            auth_url: optional(&lookup, "SPOTIFY_API_AUTH_URL")
                .unwrap_or_else(|| SPOTIFY_API_AUTH_URL.into()),
            token_url: optional(&lookup, "SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| SPOTIFY_API_TOKEN_URL.into()),
            auth_timeout: Duration::from_secs(
                parsed(&lookup, "SPOTIFY_AUTH_TIMEOUT_SECS")?.unwrap_or(AUTH_TIMEOUT_SECS),
            ),
        })
    }
}

fn optional<F>(lookup: &F, var: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, var).ok_or(ConfigError::Missing(var))
}

fn parsed<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match optional(lookup, var) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn lastfm_defaults_apply() {
        let cfg = LastfmConfig::from_lookup(lookup(&[
            ("LASTFM_API_KEY", "key"),
            ("LASTFM_SHARED_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(cfg.api_url, LASTFM_API_URL);
        assert_eq!(cfg.callback_port, 8080);
        assert_eq!(cfg.auth_timeout, Duration::from_secs(120));
        assert_eq!(cfg.session_file, PathBuf::from("lastfm_session.json"));
        assert_eq!(cfg.callback_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn lastfm_missing_secret_is_reported() {
        let err = LastfmConfig::from_lookup(lookup(&[("LASTFM_API_KEY", "key")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("LASTFM_SHARED_SECRET"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = LastfmConfig::from_lookup(lookup(&[
            ("LASTFM_API_KEY", "  "),
            ("LASTFM_SHARED_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("LASTFM_API_KEY"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = LastfmConfig::from_lookup(lookup(&[
            ("LASTFM_API_KEY", "key"),
            ("LASTFM_SHARED_SECRET", "secret"),
            ("LASTFM_CALLBACK_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "LASTFM_CALLBACK_PORT",
                ..
            }
        ));
    }

    #[test]
    fn spotify_requires_client_id() {
        let err = SpotifyConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SPOTIPY_CLIENT_ID"));

        let cfg = SpotifyConfig::from_lookup(lookup(&[("SPOTIPY_CLIENT_ID", "abc")])).unwrap();
        assert_eq!(cfg.redirect_uri, SPOTIFY_REDIRECT_URI);
        assert_eq!(cfg.scope, "playlist-read-private");
        assert_eq!(cfg.auth_timeout, Duration::from_secs(120));
    }

    #[test]
    fn spotify_timeout_is_configurable() {
        let cfg = SpotifyConfig::from_lookup(lookup(&[
            ("SPOTIPY_CLIENT_ID", "abc"),
            ("SPOTIFY_AUTH_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(cfg.auth_timeout, Duration::from_secs(30));

        let err = SpotifyConfig::from_lookup(lookup(&[
            ("SPOTIPY_CLIENT_ID", "abc"),
            ("SPOTIFY_AUTH_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "SPOTIFY_AUTH_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn missing_env_file_is_not_a_problem() {
        let path = std::env::temp_dir().join("scrobblecli-no-such-dir/.env");
        let err = dotenv::from_path(&path).unwrap_err();
        assert_eq!(env_file_problem(&err), None);
    }

    #[test]
    fn malformed_env_file_is_reported() {
        let dir = std::env::temp_dir().join(format!("scrobblecli-env-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".env");
        std::fs::write(&path, "THIS LINE IS NOT AN ASSIGNMENT\n").unwrap();

        let err = dotenv::from_path(&path).unwrap_err();
        assert!(env_file_problem(&err).is_some());
    }
}
