use std::path::{Path, PathBuf};

use crate::{Res, types::Session};

/// Keeps the single Last.fm session record on disk.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the stored session with `session`.
    ///
    /// The JSON is written next to the target and renamed over it, so a
    /// reader sees either the old record or the new one.
    pub async fn save(&self, session: &Session) -> Res<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(session)?;
        let tmp = self.tmp_path();
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Returns the stored session key.
    ///
    /// A missing, unreadable or malformed file, or a record without a
    /// non-empty `key`, all count as "not authenticated yet".
    pub async fn load(&self) -> Option<String> {
        self.load_session().await.map(|s| s.key)
    }

    pub async fn load_session(&self) -> Option<Session> {
        let content = async_fs::read_to_string(&self.path).await.ok()?;
        let session: Session = serde_json::from_str(&content).ok()?;
        (!session.key.is_empty()).then_some(session)
    }

    /// Forgets the stored session. Clearing an absent file is not an error.
    pub async fn clear(&self) -> Res<()> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "scrobblecli-session-{}-{}",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("lastfm_session.json")
    }

    #[tokio::test]
    async fn save_then_load_returns_the_key() {
        let store = SessionStore::new(scratch("roundtrip"));
        let session = Session::new("d580d57f32848f5dcf574d1ce18d78b2", Some("rj".into()));

        store.save(&session).await.unwrap();

        assert_eq!(
            store.load().await.as_deref(),
            Some("d580d57f32848f5dcf574d1ce18d78b2")
        );
        assert_eq!(store.load_session().await, Some(session));
    }

    #[tokio::test]
    async fn save_replaces_previous_record() {
        let store = SessionStore::new(scratch("replace"));
        store.save(&Session::new("first", None)).await.unwrap();
        store.save(&Session::new("second", None)).await.unwrap();

        assert_eq!(store.load().await.as_deref(), Some("second"));
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn load_without_file_is_absent() {
        let store = SessionStore::new(scratch("missing"));
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn load_corrupted_file_is_absent() {
        let path = scratch("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        for content in ["{not json", "[]", r#"{"name":"rj"}"#, r#"{"key":""}"#] {
            std::fs::write(&path, content).unwrap();
            assert_eq!(SessionStore::new(&path).load().await, None, "{content}");
        }
    }

    #[tokio::test]
    async fn clear_removes_the_record() {
        let store = SessionStore::new(scratch("clear"));
        store.save(&Session::new("key", None)).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.load().await, None);
        store.clear().await.unwrap();
    }
}
