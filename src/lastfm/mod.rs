//! # Last.fm Module
//!
//! Everything that talks to the Last.fm web service (`ws.audioscrobbler.com/2.0/`).
//!
//! - [`signature`] - `api_sig` computation and the request builder
//! - [`client`] - HTTP transport, `auth.getSession` and `user.getInfo`
//! - [`scrobble`] - single and batch `track.scrobble` with acknowledgement parsing
//! - [`auth`] - the one-time browser handshake that yields the session key
//!
//! Every authenticated call is a form-encoded POST of `method`, `api_key`,
//! the method's own parameters, `api_sig` and `format=json`. Read-only calls
//! are unsigned GETs.

pub mod auth;
pub mod client;
pub mod scrobble;
pub mod signature;

pub use client::LastfmClient;
pub use scrobble::Submitter;
