use std::fmt;

use crate::{
    config::LastfmConfig,
    info,
    lastfm::{LastfmClient, client::SessionReply},
    management::SessionStore,
    server::{CallbackError, start_callback_server},
    success,
    types::Session,
    warning,
};

const TOKEN_RECEIVED_PAGE: &str = "<h1>Token received! You can close this window.</h1>";

/// Ways the Last.fm handshake can fail. All of them are fatal for a run.
#[derive(Debug)]
pub enum AuthError {
    /// The local listener could not be started.
    Listener(String),
    /// The browser never came back within the configured timeout.
    TimedOut(u64),
    /// The redirect arrived without a `token` query parameter.
    MissingToken,
    /// The listener went away before delivering a token.
    ListenerClosed,
    /// Transport failure while calling `auth.getSession`.
    Request(String),
    /// `auth.getSession` did not return a session.
    Rejected(String),
    /// The session was obtained but could not be written to disk.
    Persist(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Listener(e) => write!(f, "could not start the callback listener: {e}"),
            AuthError::TimedOut(secs) => {
                write!(f, "authentication timed out after {secs} seconds")
            }
            AuthError::MissingToken => write!(f, "the browser redirect carried no token"),
            AuthError::ListenerClosed => write!(f, "the callback listener stopped early"),
            AuthError::Request(e) => write!(f, "session request failed: {e}"),
            AuthError::Rejected(e) => write!(f, "Last.fm refused the session: {e}"),
            AuthError::Persist(e) => write!(f, "could not save the session: {e}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<CallbackError> for AuthError {
    fn from(err: CallbackError) -> Self {
        match err {
            CallbackError::TimedOut(after) => AuthError::TimedOut(after.as_secs()),
            CallbackError::Closed => AuthError::ListenerClosed,
        }
    }
}

/// Browser URL that asks the user to grant this API key access.
pub fn authorize_url(config: &LastfmConfig) -> String {
    format!(
        "{auth_url}?api_key={api_key}&cb={callback}",
        auth_url = config.auth_url,
        api_key = config.api_key,
        callback = config.callback_url(),
    )
}

/// Returns the stored session key, running the browser handshake first when
/// none is stored.
pub async fn ensure_authenticated(
    client: &LastfmClient,
    store: &SessionStore,
) -> Result<String, AuthError> {
    if let Some(key) = store.load().await {
        return Ok(key);
    }

    authenticate(client, store).await.map(|s| s.key)
}

/// Runs the one-time browser handshake and persists the resulting session.
///
/// 1. start the one-shot listener on the callback port
/// 2. open the authorization page
/// 3. wait (bounded) for the redirect carrying `token`
/// 4. exchange the token through `auth.getSession`
/// 5. save the returned session
pub async fn authenticate(
    client: &LastfmClient,
    store: &SessionStore,
) -> Result<Session, AuthError> {
    let config = client.config();

    let pending = start_callback_server(config.callback_addr(), "token", TOKEN_RECEIVED_PAGE)
        .await
        .map_err(|e| AuthError::Listener(e.to_string()))?;

    info!("Launching browser to authenticate with Last.fm...");
    let url = authorize_url(config);
    if webbrowser::open(&url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        );
    }

    let token = pending
        .wait(config.auth_timeout)
        .await?
        .ok_or(AuthError::MissingToken)?;
    info!("Token received, requesting a session...");

    let session = exchange_token(client, &token).await?;
    store
        .save(&session)
        .await
        .map_err(|e| AuthError::Persist(e.to_string()))?;

    success!(
        "Authenticated{}",
        session
            .name
            .as_deref()
            .map(|n| format!(" as {n}"))
            .unwrap_or_default()
    );
    Ok(session)
}

/// Exchanges a browser token for a session.
pub async fn exchange_token(client: &LastfmClient, token: &str) -> Result<Session, AuthError> {
    match client.get_session(token).await {
        Ok(SessionReply::Established(session)) => Ok(session),
        Ok(SessionReply::Rejected(reason)) => Err(AuthError::Rejected(reason)),
        Err(e) => Err(AuthError::Request(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use super::*;

    fn config() -> LastfmConfig {
        LastfmConfig {
            api_key: "abc".into(),
            shared_secret: "secret".into(),
            api_url: "http://127.0.0.1:9/2.0/".into(),
            auth_url: "https://www.last.fm/api/auth/".into(),
            callback_port: 8080,
            auth_timeout: Duration::from_secs(120),
            session_file: PathBuf::from("unused.json"),
        }
    }

    #[test]
    fn authorize_url_points_back_to_the_listener() {
        assert_eq!(
            authorize_url(&config()),
            "https://www.last.fm/api/auth/?api_key=abc&cb=http://127.0.0.1:8080"
        );
    }

    #[tokio::test]
    async fn stored_key_skips_the_handshake() {
        let dir = std::env::temp_dir().join(format!("scrobblecli-auth-{}", std::process::id()));
        let store = SessionStore::new(dir.join("lastfm_session.json"));
        store.save(&Session::new("stored-key", None)).await.unwrap();

        // api_url is unroutable: any network call would fail the test.
        let client = LastfmClient::new(config());
        let key = ensure_authenticated(&client, &store).await.unwrap();
        assert_eq!(key, "stored-key");
    }

    #[test]
    fn callback_errors_map_to_auth_errors() {
        assert!(matches!(
            AuthError::from(CallbackError::TimedOut(Duration::from_secs(120))),
            AuthError::TimedOut(120)
        ));
        assert_eq!(
            AuthError::TimedOut(120).to_string(),
            "authentication timed out after 120 seconds"
        );
    }
}
