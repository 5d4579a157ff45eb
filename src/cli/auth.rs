use crate::{
    config::LastfmConfig, error, info, lastfm, lastfm::LastfmClient, management::SessionStore,
    success,
};

/// Runs the Last.fm handshake even when a session is stored, replacing it.
pub async fn auth() {
    let config = match LastfmConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    let store = SessionStore::new(config.session_file.clone());
    let client = LastfmClient::new(config);

    if let Err(e) = lastfm::auth::authenticate(&client, &store).await {
        error!("Failed to authenticate with Last.fm: {}", e);
    }
    info!("Session saved to {}", store.path().display());
}

/// Deletes the stored Last.fm session.
pub async fn logout() {
    let config = match LastfmConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    let store = SessionStore::new(config.session_file);
    match store.clear().await {
        Ok(()) => success!("Removed Last.fm session {}", store.path().display()),
        Err(e) => error!("Failed to remove {}: {}", store.path().display(), e),
    }
}
