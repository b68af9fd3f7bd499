//! Session identity and its session-scoped persistence.

use crate::error::Result;
use cloudbox_client::{AuthResponse, UserProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Key the token is stored under.
pub const SESSION_KEY: &str = "token";

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

/// Storage area holding at most one session.
///
/// Implementations must make [`SessionStorage::clear_token`] atomic so that
/// concurrent unauthorized responses clear a token only once.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;

    fn store(&self, session: &Session) -> Result<()>;

    /// Remove any stored session. Returns whether one was present.
    fn clear(&self) -> Result<bool>;

    /// Remove the stored session only if it still holds `token`.
    ///
    /// Returns whether a session was removed.
    fn clear_token(&self, token: &str) -> Result<bool>;
}

/// In-process storage, scoped to the store that owns it.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, session: &Session) -> Result<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some())
    }

    fn clear_token(&self, token: &str) -> Result<bool> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|s| s.token == token) {
            *guard = None;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Storage backed by a JSON file, so a session outlives one process.
///
/// The file holds an object keyed by [`SESSION_KEY`], plus the identity
/// metadata under `user`.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

/// On-disk layout. The field name must stay equal to [`SESSION_KEY`].
#[derive(Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserProfile>,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Session>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&raw)?;
        Ok(stored.token.map(|token| Session {
            token,
            user: stored.user,
        }))
    }

    fn remove(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session file removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<Session>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read()
    }

    fn store(&self, session: &Session) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let stored = StoredSession {
            token: Some(session.token.clone()),
            user: session.user.clone(),
        };
        std::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;

        debug!(path = %self.path.display(), "Session stored");
        Ok(())
    }

    fn clear(&self) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.remove()
    }

    fn clear_token(&self, token: &str) -> Result<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.read()? {
            Some(session) if session.token == token => self.remove(),
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemorySessionStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.store(&Session::new("abc")).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().token, "abc");

        assert!(storage.clear().unwrap());
        assert!(!storage.clear().unwrap());
    }

    #[test]
    fn test_clear_token_only_matching() {
        let storage = MemorySessionStorage::with_session(Session::new("new"));

        assert!(!storage.clear_token("old").unwrap());
        assert!(storage.load().unwrap().is_some());

        assert!(storage.clear_token("new").unwrap());
        assert!(!storage.clear_token("new").unwrap());
    }

    #[test]
    fn test_file_storage_keyed_by_token() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path().join("nested/session.json"));

        let session = Session {
            token: "jwt".into(),
            user: Some(UserProfile {
                id: Some("u1".into()),
                name: Some("Ada".into()),
                email: None,
            }),
        };
        storage.store(&session).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(storage.path()).unwrap()).unwrap();
        assert_eq!(raw[SESSION_KEY], "jwt");

        assert_eq!(storage.load().unwrap(), Some(session));
        assert!(!storage.clear_token("other").unwrap());
        assert!(storage.clear_token("jwt").unwrap());
        assert!(storage.load().unwrap().is_none());
        assert!(!storage.clear().unwrap());
    }
}
