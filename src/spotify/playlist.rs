use reqwest::{Client, Url};

use crate::{
    Res,
    config::SpotifyConfig,
    types::{PlaylistItem, PlaylistTracksResponse, TrackRef},
    utils,
};

const PAGE_LIMIT: &str = "100";
const PAGE_FIELDS: &str = "items(track(name,artists(name))),next";

/// Reads every track of a playlist as `(first artist, title)` pairs.
///
/// Requests pages of 100 items, restricted to the track name and artist
/// names, and follows the `next` links until the last page. A spinner runs
/// while pages load.
///
/// # Arguments
///
/// * `config` - Spotify settings; only `api_url` is used here
/// * `token` - Valid access token, see [`ensure_token`](crate::spotify::auth::ensure_token)
/// * `playlist_id` - Bare playlist id as returned by [`utils::playlist_id`]
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(Vec<TrackRef>)` - Tracks in playlist order. Removed or local
///   tracks and items without an artist (podcast episodes) are skipped.
/// - `Err(...)` - Network error or a non-success HTTP status (for example
///   404 for an unknown or private playlist)
///
/// # Example
///
/// ```
/// let tracks = get_playlist_tracks(&config, &token, "37i9dQZF1DXcBWIGoYBM5M").await?;
/// for track in &tracks {
///     println!("{} - {}", track.artist, track.title);
/// }
/// ```
pub async fn get_playlist_tracks(
    config: &SpotifyConfig,
    token: &str,
    playlist_id: &str,
) -> Res<Vec<TrackRef>> {
    let client = Client::new();
    let pb = utils::spinner("Loading playlist from Spotify...");

    let mut url = Url::parse_with_params(
        &format!(
            "{api}/playlists/{playlist_id}/tracks",
            api = config.api_url.trim_end_matches('/')
        ),
        &[("limit", PAGE_LIMIT), ("fields", PAGE_FIELDS)],
    )?;
    let mut tracks = Vec::new();

    loop {
        let response = client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let page = match response {
            Ok(resp) => resp.json::<PlaylistTracksResponse>().await,
            Err(err) => Err(err),
        };

        let page = match page {
            Ok(page) => page,
            Err(err) => {
                pb.finish_and_clear();
                return Err(err.into());
            }
        };

        tracks.extend(tracks_from_items(page.items));

        match page.next {
            Some(next) => url = Url::parse(&next)?,
            None => break,
        }
    }

    pb.finish_and_clear();
    Ok(tracks)
}

pub fn tracks_from_items(items: Vec<PlaylistItem>) -> Vec<TrackRef> {
    items
        .into_iter()
        .filter_map(|item| item.track)
        .filter_map(|track| {
            let artist = track.artists.into_iter().next()?;
            Some(TrackRef::new(artist.name, track.name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_artist_and_title_are_taken() {
        let page: PlaylistTracksResponse = serde_json::from_str(
            r#"{
                "items": [
                    {"track": {"name": "One More Time", "artists": [{"name": "Daft Punk"}, {"name": "Romanthony"}]}},
                    {"track": null},
                    {"track": {"name": "Episode 12", "artists": []}},
                    {"track": {"name": "Windowlicker", "artists": [{"name": "Aphex Twin"}]}}
                ],
                "next": null
            }"#,
        )
        .unwrap();

        assert_eq!(
            tracks_from_items(page.items),
            vec![
                TrackRef::new("Daft Punk", "One More Time"),
                TrackRef::new("Aphex Twin", "Windowlicker"),
            ]
        );
    }
}
