use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tabled::Tabled;

/// Seconds subtracted from the capture time before a play is submitted.
pub const SCROBBLE_BACKDATE_SECS: i64 = 60;

/// A track to report, as entered on the command line or read from a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub artist: String,
    pub title: String,
}

impl TrackRef {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub artist: String,
    pub title: String,
}

/// One play to report. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    pub artist: String,
    pub title: String,
    pub timestamp: i64,
}

impl TrackEvent {
    /// Builds the event for a play captured at `now`, backdated by
    /// [`SCROBBLE_BACKDATE_SECS`].
    pub fn captured(track: &TrackRef, now: i64) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            timestamp: now - SCROBBLE_BACKDATE_SECS,
        }
    }
}

/// The Last.fm session record returned by `auth.getSession` and kept on disk.
///
/// Fields other than `key` and `name` (e.g. `subscriber`) are carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    pub fn new(key: impl Into<String>, name: Option<String>) -> Self {
        Self {
            key: key.into(),
            name,
            extra: Map::new(),
        }
    }
}

/// Error object Last.fm returns instead of a payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LastfmApiError {
    pub error: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub session: Session,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoResponse {
    pub user: UserInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub playcount: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrobbleResponse {
    pub scrobbles: Scrobbles,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scrobbles {
    #[serde(default)]
    pub scrobble: OneOrMany<RawScrobble>,
}

/// Last.fm encodes a one-element list as a bare object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawScrobble {
    pub artist: Option<CorrectableText>,
    pub track: Option<CorrectableText>,
    #[serde(rename = "ignoredMessage")]
    pub ignored_message: Option<IgnoredMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorrectableText {
    #[serde(default, deserialize_with = "string_or_number")]
    pub corrected: String,
    #[serde(rename = "#text", default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgnoredMessage {
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(rename = "#text", default)]
    pub text: String,
}

/// Why Last.fm did not count a play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredReason {
    pub code: String,
    pub message: String,
}

/// Per-track outcome of a submission. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrobbleAck {
    pub index: usize,
    pub ignored: Option<IgnoredReason>,
    pub corrected_artist: Option<String>,
    pub corrected_track: Option<String>,
}

impl From<(usize, RawScrobble)> for ScrobbleAck {
    fn from((index, raw): (usize, RawScrobble)) -> Self {
        let corrected = |field: Option<CorrectableText>| {
            field
                .filter(|f| f.corrected == "1")
                .map(|f| f.text)
        };

        ScrobbleAck {
            index,
            ignored: raw
                .ignored_message
                .filter(|m| !m.code.is_empty() && m.code != "0")
                .map(|m| IgnoredReason {
                    code: m.code,
                    message: m.text,
                }),
            corrected_artist: corrected(raw.artist),
            corrected_track: corrected(raw.track),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksResponse {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrack {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<PlaylistArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistArtist {
    pub name: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if b { "1".into() } else { "0".into() }),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_event_is_backdated() {
        let track = TrackRef::new("Daft Punk", "One More Time");
        let event = TrackEvent::captured(&track, 1_700_000_100);
        assert_eq!(event.timestamp, 1_700_000_040);
        assert_eq!(event.artist, "Daft Punk");
        assert_eq!(event.title, "One More Time");
    }

    #[test]
    fn session_keeps_unknown_fields() {
        let json = r#"{"name":"rj","key":"d580d57f32848f5dcf574d1ce18d78b2","subscriber":0}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.name.as_deref(), Some("rj"));
        assert_eq!(session.extra.get("subscriber"), Some(&Value::from(0)));

        let back = serde_json::to_value(&session).unwrap();
        assert_eq!(back["subscriber"], Value::from(0));
        assert_eq!(back["key"], "d580d57f32848f5dcf574d1ce18d78b2");
    }

    #[test]
    fn ack_ignores_zero_code_and_uncorrected_fields() {
        let raw: RawScrobble = serde_json::from_str(
            r##"{
                "artist": {"corrected": "0", "#text": "Daft Punk"},
                "track": {"corrected": "0", "#text": "One More Time"},
                "ignoredMessage": {"code": "0", "#text": ""}
            }"##,
        )
        .unwrap();

        assert_eq!(
            ScrobbleAck::from((0, raw)),
            ScrobbleAck {
                index: 0,
                ..Default::default()
            }
        );
    }

    #[test]
    fn ack_accepts_numeric_flags() {
        let raw: RawScrobble = serde_json::from_str(
            r##"{
                "artist": {"corrected": 1, "#text": "Daft Punk"},
                "ignoredMessage": {"code": 1, "#text": "Artist was ignored"}
            }"##,
        )
        .unwrap();

        let ack = ScrobbleAck::from((3, raw));
        assert_eq!(ack.corrected_artist.as_deref(), Some("Daft Punk"));
        assert_eq!(ack.corrected_track, None);
        assert_eq!(
            ack.ignored,
            Some(IgnoredReason {
                code: "1".into(),
                message: "Artist was ignored".into()
            })
        );
    }
}
