//! # API Module
//!
//! HTTP handlers for the local callback listener started during browser
//! authorization.
//!
//! - [`capture`] - answers the single redirect request, extracting one query
//!   parameter (`token` for Last.fm, `code` for Spotify) and handing it to the
//!   waiting flow.
//!
//! The handler is mounted as the router fallback by
//! [`crate::server::start_callback_server`], so it sees every path.

mod callback;

pub use callback::CaptureState;
pub use callback::capture;
