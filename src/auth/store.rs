//! Session persistence
//!
//! The store is a dumb key-value boundary: it never validates tokens, and a
//! corrupt or partial layout loads as "no session" so the user signs in again.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::auth::models::{Identity, Session};
use crate::error::Result;

/// Storage key holding the opaque token
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-serialized identity
pub const USER_KEY: &str = "user";

/// Persistence for the current session
pub trait SessionStore: Send + Sync {
    /// Persist a session, replacing any previous one
    fn save(&self, session: &Session) -> Result<()>;

    /// Load the persisted session, or `None` when absent or unusable
    fn load(&self) -> Option<Session>;

    /// Remove the persisted session. Clearing an empty store succeeds.
    fn clear(&self) -> Result<()>;
}

/// Rebuild a session from raw `token` and `user` values
fn decode_session(token: Option<String>, user: Option<String>) -> Option<Session> {
    let token = token?;
    let user = user?;

    let token = token.trim();
    if token.is_empty() {
        tracing::warn!("Stored session has an empty token, ignoring");
        return None;
    }

    match serde_json::from_str::<Identity>(&user) {
        Ok(identity) => Some(Session::new(token, identity)),
        Err(e) => {
            tracing::warn!("Stored user profile is unreadable, ignoring session: {}", e);
            None
        }
    }
}

/// File-backed store: one file per storage key inside a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn read(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path(key)) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read stored {}: {}", key, e);
                None
            }
        }
    }

    /// Write `content` beside the entry, then rename it into place
    fn write_entry(&self, key: &str, content: &str) -> Result<()> {
        let staged = self.dir.join(format!(".{}.tmp", key));
        fs::write(&staged, content)?;
        fs::rename(&staged, self.path(key))?;
        Ok(())
    }

    /// First half of a save: drop the old token and put the new user in place.
    /// Until the token is committed the layout loads as `None`.
    fn stage_user(&self, session: &Session) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let user = serde_json::to_string(&session.identity)?;
        self.remove(TOKEN_KEY)?;
        self.write_entry(USER_KEY, &user)
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        // The old token never sits beside the new user
        self.stage_user(session)?;
        self.write_entry(TOKEN_KEY, &session.token)
    }

    fn load(&self) -> Option<Session> {
        decode_session(self.read(TOKEN_KEY), self.read(USER_KEY))
    }

    fn clear(&self) -> Result<()> {
        self.remove(TOKEN_KEY)?;
        self.remove(USER_KEY)?;
        Ok(())
    }
}

/// In-memory store holding the same raw layout as the file store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<(Option<String>, Option<String>)>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the raw stored values, bypassing serialization
    pub fn put_raw(&self, token: Option<&str>, user: Option<&str>) {
        let mut entries = self.lock();
        *entries = (token.map(str::to_string), user.map(str::to_string));
    }

    /// Raw stored token, if any
    pub fn raw_token(&self) -> Option<String> {
        self.lock().0.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, (Option<String>, Option<String>)> {
        // A poisoned lock still holds plain strings
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let user = serde_json::to_string(&session.identity)?;
        *self.lock() = (Some(session.token.clone()), Some(user));
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        let (token, user) = self.lock().clone();
        decode_session(token, user)
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = (None, None);
        Ok(())
    }
}
