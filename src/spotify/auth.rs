use chrono::Utc;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::{
    Res,
    config::SpotifyConfig,
    info,
    management::TokenManager,
    server::start_callback_server,
    success,
    types::Token,
    utils, warning,
};

const AUTHORIZED_PAGE: &str =
    "<h2>Spotify authorization complete.</h2><p>You can close this window.</p>";

/// Returns a usable Spotify access token.
///
/// Uses the cached token when there is one, refreshing it if it is about to
/// expire. Without a cached token, or when the refresh fails, the full PKCE
/// flow runs in the browser.
///
/// # Arguments
///
/// * `config` - Spotify client settings, including the redirect URI the
///   local listener binds to
///
/// # Returns
///
/// Returns a `Result` containing:
/// - `Ok(String)` - Bearer token for the Web API
/// - `Err(...)` - The browser flow failed, timed out or the token exchange
///   was refused
///
/// # Example
///
/// ```
/// let config = SpotifyConfig::from_env()?;
/// let token = ensure_token(&config).await?;
/// let tracks = get_playlist_tracks(&config, &token, "37i9dQZF1DXcBWIGoYBM5M").await?;
/// ```
pub async fn ensure_token(config: &SpotifyConfig) -> Res<String> {
    if let Ok(mut token_mgr) = TokenManager::load().await {
        match token_mgr.get_valid_token(config).await {
            Ok(token) => return Ok(token),
            Err(e) => warning!("Cached Spotify token could not be refreshed: {}", e),
        }
    }

    Ok(auth(config).await?.access_token)
}

/// Runs the OAuth 2.0 authorization code flow with PKCE.
///
/// The redirect is caught by the same one-shot listener the Last.fm
/// handshake uses, bound to the host and port of the configured redirect
/// URI. The resulting token is persisted through [`TokenManager`].
///
/// # Flow
///
/// 1. Generate a code verifier and its S256 challenge
/// 2. Start the callback listener on the redirect URI's address
/// 3. Open the authorization page (or print it when no browser starts)
/// 4. Wait up to `config.auth_timeout` for the redirect carrying `code`
/// 5. Exchange the code and verifier for a token and cache it
///
/// # Errors
///
/// Fails when the listener cannot bind, the wait times out, the redirect
/// carries no code, or the token endpoint rejects the exchange.
pub async fn auth(config: &SpotifyConfig) -> Res<Token> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    let pending =
        start_callback_server(listen_addr(&config.redirect_uri)?, "code", AUTHORIZED_PAGE).await?;

    info!("Launching browser to authorize Spotify playlist access...");
    let auth_url = authorize_url(config, &code_challenge)?;
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let code = pending
        .wait(config.auth_timeout)
        .await?
        .ok_or("Spotify redirect carried no authorization code")?;

    let token = exchange_code_pkce(config, &code, &code_verifier).await?;
    TokenManager::new(token.clone()).persist().await?;

    success!("Spotify authorization successful!");
    Ok(token)
}

/// Authorization page URL with the PKCE challenge.
pub fn authorize_url(config: &SpotifyConfig, code_challenge: &str) -> Res<Url> {
    Ok(Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", config.scope.as_str()),
        ],
    )?)
}

/// `host:port` the callback listener binds for `redirect_uri`.
///
/// A redirect without an explicit port uses the scheme's default.
///
/// # Example
///
/// ```
/// assert_eq!(listen_addr("http://127.0.0.1:8888/callback")?, "127.0.0.1:8888");
/// ```
pub fn listen_addr(redirect_uri: &str) -> Res<String> {
    let url = Url::parse(redirect_uri)?;
    let host = url
        .host_str()
        .ok_or_else(|| format!("redirect URI has no host: {redirect_uri}"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| format!("redirect URI has no port: {redirect_uri}"))?;
    Ok(format!("{host}:{port}"))
}

/// Exchanges an authorization code for a token.
pub async fn exchange_code_pkce(config: &SpotifyConfig, code: &str, verifier: &str) -> Res<Token> {
    let res = Client::new()
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let json: Value = res.json().await?;
    Ok(token_from_json(&json, Utc::now().timestamp() as u64)?)
}

/// Exchanges a refresh token for a fresh access token.
///
/// # Arguments
///
/// * `config` - Spotify client settings (client id and token endpoint)
/// * `refresh_token` - Refresh token from the cached [`Token`]
///
/// # Returns
///
/// The new token. Its `refresh_token` is empty when Spotify did not rotate
/// it; the caller keeps the old one in that case.
///
/// # Errors
///
/// Returns the transport error or Spotify's `error_description` as a string.
pub async fn refresh_token(config: &SpotifyConfig, refresh_token: &str) -> Result<Token, String> {
    let res = Client::new()
        .post(&config.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let json: Value = res.json().await.map_err(|e| e.to_string())?;
    token_from_json(&json, Utc::now().timestamp() as u64)
}

/// Reads a token endpoint response.
pub fn token_from_json(json: &Value, obtained_at: u64) -> Result<Token, String> {
    let Some(access_token) = json["access_token"].as_str() else {
        let reason = json["error_description"]
            .as_str()
            .or_else(|| json["error"].as_str())
            .unwrap_or("no access_token in response");
        return Err(format!("Spotify token request failed: {reason}"));
    };

    Ok(Token {
        access_token: access_token.to_string(),
        refresh_token: json["refresh_token"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        expires_in: json["expires_in"].as_u64().unwrap_or(3600),
        obtained_at,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::{SPOTIFY_API_AUTH_URL, SPOTIFY_API_TOKEN_URL, SPOTIFY_API_URL};

    fn config() -> SpotifyConfig {
        SpotifyConfig {
            client_id: "client".into(),
            redirect_uri: "http://127.0.0.1:8888/callback".into(),
            scope: "playlist-read-private".into(),
            api_url: SPOTIFY_API_URL.into(),
            auth_url: SPOTIFY_API_AUTH_URL.into(),
            token_url: SPOTIFY_API_TOKEN_URL.into(),
            auth_timeout: std::time::Duration::from_secs(120),
        }
    }

    #[test]
    fn listen_addr_follows_the_redirect_uri() {
        assert_eq!(
            listen_addr("http://127.0.0.1:8888/callback").unwrap(),
            "127.0.0.1:8888"
        );
        assert_eq!(listen_addr("http://localhost/cb").unwrap(), "localhost:80");
        assert!(listen_addr("not a url").is_err());
    }

    #[test]
    fn authorize_url_encodes_parameters() {
        let url = authorize_url(&config(), "challenge").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("client_id".into(), "client".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://127.0.0.1:8888/callback".into()
        )));
        assert!(pairs.contains(&("code_challenge_method".into(), "S256".into())));
        assert!(url.as_str().starts_with(SPOTIFY_API_AUTH_URL));
    }

    #[test]
    fn token_response_is_read() {
        let token = token_from_json(
            &json!({
                "access_token": "BQC",
                "refresh_token": "AQD",
                "scope": "playlist-read-private",
                "expires_in": 3600
            }),
            10,
        )
        .unwrap();

        assert_eq!(token.access_token, "BQC");
        assert_eq!(token.refresh_token, "AQD");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.obtained_at, 10);
    }

    #[test]
    fn token_error_is_reported() {
        let err = token_from_json(
            &json!({"error": "invalid_grant", "error_description": "Invalid authorization code"}),
            0,
        )
        .unwrap_err();
        assert!(err.contains("Invalid authorization code"));
    }
}
