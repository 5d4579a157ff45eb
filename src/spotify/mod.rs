//! # Spotify Module
//!
//! The playlist reader: turns a Spotify playlist reference into the list of
//! `(artist, title)` pairs to scrobble.
//!
//! - [`auth`] - OAuth 2.0 authorization code flow with PKCE, using the shared
//!   one-shot callback listener; tokens are cached and refreshed by
//!   [`crate::management::TokenManager`]
//! - [`playlist`] - paginated `GET /playlists/{id}/tracks`
//!
//! Spotify credentials are entirely separate from the Last.fm ones; a run
//! that scrobbles a single `--track` never touches this module.

pub mod auth;
pub mod playlist;
