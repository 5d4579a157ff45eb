use std::{
    io::{self, BufRead, IsTerminal, Write},
    time::Duration,
};

use tabled::Table;

use crate::{
    Res,
    config::{LastfmConfig, SpotifyConfig},
    error, info,
    lastfm::{self, LastfmClient, Submitter},
    management::SessionStore,
    spotify, success,
    types::{ScrobbleAck, TrackEvent, TrackRef, TrackTableRow},
    utils, warning,
};

/// Pause after each batch submission.
pub const BATCH_PAUSE: Duration = Duration::from_secs(2);
/// Pause after each single-track submission.
pub const SINGLE_PAUSE: Duration = Duration::from_millis(1500);

/// Where the tracks of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// Spotify playlist id.
    Playlist(String),
    Track(TrackRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// One `track.scrobble` call per track.
    Single,
    /// One indexed `track.scrobble` call per loop.
    Batch,
}

#[derive(Debug, Clone)]
pub struct ScrobbleOptions {
    pub source: TrackSource,
    pub loops: u32,
    pub user: String,
    /// Skip the interactive loop-count prompt.
    pub assume_yes: bool,
}

pub async fn scrobble(opts: ScrobbleOptions) {
    let config = match LastfmConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    let store = SessionStore::new(config.session_file.clone());
    let client = LastfmClient::new(config);

    let session_key = match lastfm::auth::ensure_authenticated(&client, &store).await {
        Ok(key) => key,
        Err(e) => error!("Failed to authenticate with Last.fm: {}", e),
    };
    if let Some(name) = session_owner(&store).await {
        info!("Using Last.fm session for {}", name);
    }

    let (tracks, mode) = match opts.source {
        TrackSource::Playlist(id) => (load_playlist(&id).await, SubmitMode::Batch),
        TrackSource::Track(track) => (vec![track], SubmitMode::Single),
    };

    if tracks.is_empty() {
        warning!("Nothing to scrobble.");
        return;
    }

    info!("Preparing to scrobble {} track(s)", tracks.len());
    println!("{}", track_table(&tracks));

    let loops = if opts.loops == 1 && !opts.assume_yes && io::stdin().is_terminal() {
        prompt_loop_count()
    } else {
        opts.loops
    };

    let initial_count = match play_count(&client, &opts.user).await {
        Ok(count) => count,
        Err(e) => error!("Failed to fetch scrobble count for {}: {}", opts.user, e),
    };
    info!("You currently have {} scrobbles on Last.fm", initial_count);

    let pause = match mode {
        SubmitMode::Batch => BATCH_PAUSE,
        SubmitMode::Single => SINGLE_PAUSE,
    };

    if let Err(e) = run_loops(
        &client,
        &session_key,
        &tracks,
        mode,
        loops,
        pause,
        utils::now_unix,
    )
    .await
    {
        error!("Scrobbling failed: {}", e);
    }

    let final_count = match play_count(&client, &opts.user).await {
        Ok(count) => count,
        Err(e) => error!("Failed to fetch scrobble count for {}: {}", opts.user, e),
    };
    success!(
        "Done! New scrobble count: {} (added {})",
        final_count,
        final_count.saturating_sub(initial_count)
    );
}

/// Account name stored with the session, when Last.fm reported one.
async fn session_owner(store: &SessionStore) -> Option<String> {
    store.load_session().await.and_then(|session| session.name)
}

/// Submits `tracks` `loops` times.
///
/// Every submission is timestamped freshly from `clock` (then backdated by a
/// minute). In batch mode each loop is one call carrying all tracks; in
/// single mode each track is its own call. `pause` is slept after every call.
/// Acknowledgements are reported as they arrive and returned in order.
pub async fn run_loops<S, C>(
    submitter: &S,
    session_key: &str,
    tracks: &[TrackRef],
    mode: SubmitMode,
    loops: u32,
    pause: Duration,
    clock: C,
) -> Res<Vec<ScrobbleAck>>
where
    S: Submitter,
    C: Fn() -> i64,
{
    let mut acks = Vec::new();

    for i in 0..loops {
        info!("Loop {}/{}", i + 1, loops);

        match mode {
            SubmitMode::Batch => {
                let batch: Vec<TrackEvent> = tracks
                    .iter()
                    .map(|track| {
                        info!("Queued: {} – {}", track.artist, track.title);
                        TrackEvent::captured(track, clock())
                    })
                    .collect();

                info!("Sending batch of {} track(s)...", batch.len());
                let result = submitter.scrobble_batch(session_key, &batch).await?;
                report_acks(&result, &batch);
                acks.extend(result);
                tokio::time::sleep(pause).await;
            }
            SubmitMode::Single => {
                for track in tracks {
                    let event = TrackEvent::captured(track, clock());
                    info!("Scrobbling: {} – {}", event.artist, event.title);
                    let result = submitter.scrobble(session_key, &event).await?;
                    report_acks(&result, std::slice::from_ref(&event));
                    acks.extend(result);
                    tokio::time::sleep(pause).await;
                }
            }
        }
    }

    Ok(acks)
}

/// Prints ignored plays as warnings and corrections as info lines.
pub fn report_acks(acks: &[ScrobbleAck], events: &[TrackEvent]) {
    for ack in acks {
        let label = events
            .get(ack.index)
            .map(|e| format!("Track {} ({} – {})", ack.index + 1, e.artist, e.title))
            .unwrap_or_else(|| format!("Track {}", ack.index + 1));

        if let Some(ignored) = &ack.ignored {
            warning!(
                "{} was ignored: {} (code {})",
                label,
                ignored.message,
                ignored.code
            );
        }
        if let Some(artist) = &ack.corrected_artist {
            info!("Artist was corrected to: {}", artist);
        }
        if let Some(track) = &ack.corrected_track {
            info!("Track name was corrected to: {}", track);
        }
    }
}

/// Reads a loop count from an answer to the interactive prompt. Anything but
/// a positive number keeps a single loop.
pub fn parse_loop_answer(answer: &str) -> u32 {
    answer
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

fn prompt_loop_count() -> u32 {
    print!("Press Enter to scrobble once, or enter a number to loop that many times: ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => parse_loop_answer(&answer),
        Err(_) => 1,
    }
}

fn track_table(tracks: &[TrackRef]) -> Table {
    Table::new(tracks.iter().enumerate().map(|(i, t)| TrackTableRow {
        position: i + 1,
        artist: t.artist.clone(),
        title: t.title.clone(),
    }))
}

async fn play_count(client: &LastfmClient, user: &str) -> Res<u64> {
    let pb = utils::spinner("Fetching scrobble count...");
    let count = client.scrobble_count(user).await;
    pb.finish_and_clear();
    count
}

async fn load_playlist(playlist_id: &str) -> Vec<TrackRef> {
    let config = match SpotifyConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    let token = match spotify::auth::ensure_token(&config).await {
        Ok(token) => token,
        Err(e) => error!("Failed to authorize with Spotify: {}", e),
    };

    info!("Loading playlist from Spotify: {}", playlist_id);
    match spotify::playlist::get_playlist_tracks(&config, &token, playlist_id).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to load playlist {}: {}", playlist_id, e),
    }
}
