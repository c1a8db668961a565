//! `sled`-backed history store

use super::{decode_sessions, encode_sessions, SessionStore, CHAT_HISTORY_KEY};
use crate::error::{HealthchatError, Result};
use crate::session::ChatSession;
use sled::Db;
use std::path::Path;

/// Session store backed by an embedded `sled` database
///
/// The session list is kept under [`CHAT_HISTORY_KEY`]; every save is
/// flushed before returning. Clones share one database handle.
#[derive(Clone)]
pub struct SledSessionStore {
    db: Db,
}

impl SledSessionStore {
    /// Open or create a store at `path`
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns `HealthchatError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use healthchat::storage::{SessionStore, SledSessionStore};
    ///
    /// # fn main() -> healthchat::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = SledSessionStore::open(dir.path().join("history.sled"))?;
    /// assert!(store.load()?.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HealthchatError::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }

        let db = sled::open(path)
            .map_err(|e| HealthchatError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::debug!("Opened history database at {}", path.display());
        Ok(Self { db })
    }

    /// Remove the history slot entirely
    pub fn clear(&self) -> Result<()> {
        self.db
            .remove(CHAT_HISTORY_KEY)
            .map_err(|e| HealthchatError::Storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| HealthchatError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    /// Write raw bytes into the history slot, bypassing encoding
    #[cfg(test)]
    fn put_raw(&self, bytes: &[u8]) {
        self.db.insert(CHAT_HISTORY_KEY, bytes).expect("insert raw");
    }
}

impl SessionStore for SledSessionStore {
    fn load(&self) -> Result<Vec<ChatSession>> {
        match self
            .db
            .get(CHAT_HISTORY_KEY)
            .map_err(|e| HealthchatError::Storage(format!("Get failed: {}", e)))?
        {
            Some(bytes) => decode_sessions(&bytes),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, sessions: &[ChatSession]) -> Result<()> {
        let value = encode_sessions(sessions)?;

        self.db
            .insert(CHAT_HISTORY_KEY, value)
            .map_err(|e| HealthchatError::Storage(format!("Insert failed: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| HealthchatError::Storage(format!("Flush failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::test_utils::{session_with_messages, temp_dir, temp_sled_store};

    #[test]
    fn test_load_empty_database_returns_no_sessions() {
        let dir = temp_dir();
        let store = temp_sled_store(&dir);
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = temp_dir();
        let store = temp_sled_store(&dir);
        let session = session_with_messages(&[
            (Role::User, "Is coffee bad for me?"),
            (Role::Model, "In moderation, usually not."),
        ]);
        let sessions = vec![session, ChatSession::new()];

        store.save(&sessions).expect("save");
        assert_eq!(store.load().expect("load"), sessions);
    }

    #[test]
    fn test_save_replaces_previous_list() {
        let dir = temp_dir();
        let store = temp_sled_store(&dir);
        store
            .save(&[ChatSession::new(), ChatSession::new()])
            .expect("first save");
        store.save(&[ChatSession::new()]).expect("second save");
        assert_eq!(store.load().expect("load").len(), 1);
    }

    #[test]
    fn test_load_malformed_slot_is_error() {
        let dir = temp_dir();
        let store = temp_sled_store(&dir);
        store.put_raw(b"[{\"id\": 42}");
        assert!(store.load().is_err());
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = temp_dir();
        let path = dir.path().join("nested").join("history.sled");
        let session = ChatSession::new();
        {
            let store = SledSessionStore::open(&path).expect("open");
            store.save(std::slice::from_ref(&session)).expect("save");
        }
        let reopened = SledSessionStore::open(&path).expect("reopen");
        assert_eq!(reopened.load().expect("load"), vec![session]);
    }

    #[test]
    fn test_clear_removes_history() {
        let dir = temp_dir();
        let store = temp_sled_store(&dir);
        store.save(&[ChatSession::new()]).expect("save");
        store.clear().expect("clear");
        assert!(store.load().expect("load").is_empty());
    }
}
