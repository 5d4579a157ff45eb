use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::TrackRef;

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Current unix time in seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Parses an `"Artist - Song"` reference.
///
/// Splits on the first `" - "` so titles may contain the separator
/// themselves. Both halves are trimmed and must be non-empty.
pub fn parse_track_ref(input: &str) -> Result<TrackRef, String> {
    let Some((artist, title)) = input.split_once(" - ") else {
        return Err("Use format: 'Artist - Song'".to_string());
    };

    let (artist, title) = (artist.trim(), title.trim());
    if artist.is_empty() || title.is_empty() {
        return Err("Use format: 'Artist - Song' (artist and song must not be empty)".to_string());
    }

    Ok(TrackRef::new(artist, title))
}

/// Extracts the playlist id from a Spotify playlist URL, a
/// `spotify:playlist:<id>` URI or a bare id.
pub fn playlist_id(reference: &str) -> Result<String, String> {
    let reference = reference.trim();
    let id = if let Some(id) = reference.strip_prefix("spotify:playlist:") {
        id
    } else if let Some((_, rest)) = reference.split_once("/playlist/") {
        rest.split(['?', '#', '/']).next().unwrap_or_default()
    } else {
        reference
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("Not a Spotify playlist reference: {reference}"));
    }

    Ok(id.to_string())
}

/// Steady spinner for a remote call; call `finish_and_clear` when done.
pub fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
