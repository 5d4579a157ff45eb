use reqwest::Client;
use serde_json::Value;

use crate::{
    Res,
    config::LastfmConfig,
    lastfm::signature::ApiRequest,
    types::{LastfmApiError, SessionResponse, UserInfoResponse},
};

/// Outcome of `auth.getSession`.
#[derive(Debug, Clone)]
pub enum SessionReply {
    Established(crate::types::Session),
    Rejected(String),
}

/// HTTP access to the Last.fm web service.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct LastfmClient {
    http: Client,
    config: LastfmConfig,
}

impl LastfmClient {
    pub fn new(config: LastfmConfig) -> Self {
        Self::with_http(Client::new(), config)
    }

    pub fn with_http(http: Client, config: LastfmConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &LastfmConfig {
        &self.config
    }

    /// Starts a request for `method` carrying this client's API key.
    pub fn request(&self, method: &str) -> ApiRequest {
        ApiRequest::new(method, &self.config.api_key)
    }

    /// POSTs a signed request and returns the raw response body.
    ///
    /// Transport failures propagate; HTTP error statuses do not, because
    /// Last.fm reports API errors as JSON bodies on 4xx responses.
    pub async fn post_signed(&self, request: &ApiRequest) -> Res<String> {
        let res = self
            .http
            .post(&self.config.api_url)
            .form(&request.signed(&self.config.shared_secret))
            .send()
            .await?;
        Ok(res.text().await?)
    }

    /// GETs an unsigned, read-only request and returns the raw body.
    pub async fn get_unsigned(&self, request: &ApiRequest) -> Res<String> {
        let res = self
            .http
            .get(&self.config.api_url)
            .query(&request.unsigned())
            .send()
            .await?;
        Ok(res.text().await?)
    }

    /// Exchanges a browser token for a session via `auth.getSession`.
    pub async fn get_session(&self, token: &str) -> Res<SessionReply> {
        let request = self.request("auth.getSession").param("token", token);
        let body = self.post_signed(&request).await?;
        Ok(parse_session_reply(&body))
    }

    /// Total lifetime play count of `user` via the public `user.getInfo`.
    pub async fn scrobble_count(&self, user: &str) -> Res<u64> {
        let request = self.request("user.getInfo").param("user", user);
        let body = self.get_unsigned(&request).await?;
        parse_playcount(&body)
    }
}

pub fn parse_session_reply(body: &str) -> SessionReply {
    if let Ok(reply) = serde_json::from_str::<SessionResponse>(body) {
        return SessionReply::Established(reply.session);
    }

    match serde_json::from_str::<LastfmApiError>(body) {
        Ok(err) => SessionReply::Rejected(format!("{} (code {})", err.message, err.error)),
        Err(_) => SessionReply::Rejected(format!("unexpected response: {}", body.trim())),
    }
}

pub fn parse_playcount(body: &str) -> Res<u64> {
    let value: Value = serde_json::from_str(body)?;
    if let Ok(err) = serde_json::from_value::<LastfmApiError>(value.clone()) {
        return Err(format!("Last.fm error {}: {}", err.error, err.message).into());
    }

    let info: UserInfoResponse = serde_json::from_value(value)?;
    Ok(info.user.playcount.trim().parse::<u64>()?)
}
