use serde_json::Value;

use crate::{
    Res,
    lastfm::{LastfmClient, signature::ApiRequest},
    types::{LastfmApiError, ScrobbleAck, ScrobbleResponse, TrackEvent},
    warning,
};

pub const SCROBBLE_METHOD: &str = "track.scrobble";
/// Most plays Last.fm accepts in one `track.scrobble` call.
pub const MAX_BATCH_SIZE: usize = 50;

/// Anything that can deliver play events to Last.fm.
///
/// Implemented by [`LastfmClient`]; the run loop only depends on this trait.
#[allow(async_fn_in_trait)]
pub trait Submitter {
    async fn scrobble(&self, session_key: &str, event: &TrackEvent) -> Res<Vec<ScrobbleAck>>;

    async fn scrobble_batch(
        &self,
        session_key: &str,
        events: &[TrackEvent],
    ) -> Res<Vec<ScrobbleAck>>;
}

/// `track.scrobble` for one play.
pub fn scrobble_request(api_key: &str, session_key: &str, event: &TrackEvent) -> ApiRequest {
    ApiRequest::new(SCROBBLE_METHOD, api_key)
        .param("artist", &event.artist)
        .param("track", &event.title)
        .param("timestamp", event.timestamp)
        .param("sk", session_key)
}

/// `track.scrobble` for several plays, as `artist[i]`, `track[i]` and
/// `timestamp[i]` families in submission order. Callers keep `events` within
/// [`MAX_BATCH_SIZE`].
pub fn batch_request(api_key: &str, session_key: &str, events: &[TrackEvent]) -> ApiRequest {
    events.iter().enumerate().fold(
        ApiRequest::new(SCROBBLE_METHOD, api_key).param("sk", session_key),
        |request, (i, event)| {
            request
                .param(format!("artist[{i}]"), &event.artist)
                .param(format!("track[{i}]"), &event.title)
                .param(format!("timestamp[{i}]"), event.timestamp)
        },
    )
}

/// Interprets a `track.scrobble` response body.
///
/// Never fails: a body that is not JSON, a Last.fm error object or an
/// unexpected shape is reported and treated as "no acknowledgements".
pub fn parse_acknowledgements(body: &str) -> Vec<ScrobbleAck> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            warning!("Failed to parse Last.fm response.");
            return Vec::new();
        }
    };

    if let Ok(err) = serde_json::from_value::<LastfmApiError>(value.clone()) {
        warning!(
            "Last.fm rejected the scrobble (code {}): {}",
            err.error,
            err.message
        );
        return Vec::new();
    }

    match serde_json::from_value::<ScrobbleResponse>(value) {
        Ok(response) => response
            .scrobbles
            .scrobble
            .into_vec()
            .into_iter()
            .enumerate()
            .map(ScrobbleAck::from)
            .collect(),
        Err(_) => {
            warning!("Unexpected Last.fm response shape.");
            Vec::new()
        }
    }
}

impl Submitter for LastfmClient {
    async fn scrobble(&self, session_key: &str, event: &TrackEvent) -> Res<Vec<ScrobbleAck>> {
        let request = scrobble_request(&self.config().api_key, session_key, event);
        let body = self.post_signed(&request).await?;
        Ok(parse_acknowledgements(&body))
    }

    async fn scrobble_batch(
        &self,
        session_key: &str,
        events: &[TrackEvent],
    ) -> Res<Vec<ScrobbleAck>> {
        let mut acks = Vec::new();
        for (n, chunk) in events.chunks(MAX_BATCH_SIZE).enumerate() {
            let request = batch_request(&self.config().api_key, session_key, chunk);
            let body = self.post_signed(&request).await?;
            // Acknowledgement indices are relative to the chunk.
            acks.extend(
                parse_acknowledgements(&body)
                    .into_iter()
                    .map(|ack| ScrobbleAck {
                        index: ack.index + n * MAX_BATCH_SIZE,
                        ..ack
                    }),
            );
        }

        Ok(acks)
    }
}
