//! # CLI Module
//!
//! User-facing commands of `scrobblecli`. Each one builds its configuration,
//! drives the library modules and narrates progress with the crate's
//! console macros.
//!
//! ## Commands
//!
//! - [`scrobble`] - the default command: resolve the Last.fm session, collect
//!   tracks from `--track` or `--playlist`, then submit them `--loop` times and
//!   report the play count before and after
//! - [`auth`] - force a new Last.fm handshake, replacing the stored session
//! - [`logout`] - delete the stored Last.fm session
//!
//! ## Flow of a run
//!
//! ```text
//! config → session (stored or browser handshake) → tracks → count → loops → count
//! ```
//!
//! A `--track` run submits one `track.scrobble` per loop; a `--playlist` run
//! submits the whole playlist as one indexed batch per loop. Fatal conditions
//! go through `error!` and end the process with status 1.
//!
//! ## Usage
//!
//! ```bash
//! scrobblecli --track "Daft Punk - One More Time" --user rj
//! scrobblecli --playlist https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M --loop 3 --user rj
//! scrobblecli auth
//! ```

mod auth;
mod scrobble;

pub use auth::auth;
pub use auth::logout;
pub use scrobble::{
    BATCH_PAUSE, SINGLE_PAUSE, ScrobbleOptions, SubmitMode, TrackSource, parse_loop_answer,
    report_acks, run_loops, scrobble,
};
