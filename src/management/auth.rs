use std::path::PathBuf;

use chrono::Utc;

use crate::{config::SpotifyConfig, spotify, types::Token};

/// Seconds before expiry at which the Spotify token is refreshed.
const REFRESH_MARGIN_SECS: u64 = 240;

/// Cached Spotify token with refresh-on-expiry.
pub struct TokenManager {
    token: Token,
}

impl TokenManager {
    pub fn new(token: Token) -> Self {
        TokenManager { token }
    }

    pub async fn load() -> Result<Self, String> {
        let content = async_fs::read_to_string(Self::token_path())
            .await
            .map_err(|e| e.to_string())?;
        let token: Token = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        Ok(Self { token })
    }

    pub async fn persist(&self) -> Result<(), String> {
        let path = Self::token_path();
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.token).map_err(|e| e.to_string())?;
        async_fs::write(path, json)
            .await
            .map_err(|e| e.to_string())
    }

    /// Returns an access token, refreshing and re-persisting it first when it
    /// is about to expire.
    pub async fn get_valid_token(&mut self, config: &SpotifyConfig) -> Result<String, String> {
        if self.is_expired(Utc::now().timestamp() as u64) {
            let refreshed = spotify::auth::refresh_token(config, &self.token.refresh_token).await?;
            self.token = Token {
                // Spotify may omit a rotated refresh token.
                refresh_token: if refreshed.refresh_token.is_empty() {
                    self.token.refresh_token.clone()
                } else {
                    refreshed.refresh_token
                },
                ..refreshed
            };
            self.persist().await?;
        }

        Ok(self.token.access_token.clone())
    }

    fn is_expired(&self, now: u64) -> bool {
        now + REFRESH_MARGIN_SECS >= self.token.obtained_at + self.token.expires_in
    }

    fn token_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("scrobblecli/cache/spotify_token.json");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(obtained_at: u64, expires_in: u64) -> Token {
        Token {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            scope: "playlist-read-private".into(),
            expires_in,
            obtained_at,
        }
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let mgr = TokenManager::new(token(1_000, 3_600));
        assert!(!mgr.is_expired(1_000));
        assert!(!mgr.is_expired(1_000 + 3_600 - 241));
    }

    #[test]
    fn token_inside_refresh_margin_is_expired() {
        let mgr = TokenManager::new(token(1_000, 3_600));
        assert!(mgr.is_expired(1_000 + 3_600 - 240));
        assert!(mgr.is_expired(10_000));
    }

    #[test]
    fn short_lived_token_does_not_underflow() {
        let mgr = TokenManager::new(token(0, 60));
        assert!(mgr.is_expired(0));
    }
}
