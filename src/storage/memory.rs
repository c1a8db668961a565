//! In-process history store

use super::{decode_sessions, encode_sessions, SessionStore};
use crate::error::{HealthchatError, Result};
use crate::session::ChatSession;
use std::sync::{Arc, Mutex};

/// Session store that keeps the encoded slot in memory
///
/// Used for `--ephemeral` chats and tests. Clones share the same slot, so a
/// test can hand one clone to a manager and inspect the other. Encoding is
/// the same JSON as the on-disk store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose slot already holds `bytes`
    ///
    /// # Examples
    ///
    /// ```
    /// use healthchat::storage::{MemorySessionStore, SessionStore};
    ///
    /// let store = MemorySessionStore::with_raw(b"not json".to_vec());
    /// assert!(store.load().is_err());
    /// ```
    pub fn with_raw(bytes: Vec<u8>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(bytes))),
        }
    }

    /// Raw contents of the slot, if anything was saved
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Vec<ChatSession>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| HealthchatError::Storage("history slot poisoned".to_string()))?;
        match slot.as_deref() {
            Some(bytes) => decode_sessions(bytes),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, sessions: &[ChatSession]) -> Result<()> {
        let bytes = encode_sessions(sessions)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| HealthchatError::Storage("history slot poisoned".to_string()))?;
        *slot = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_slot() {
        let store = MemorySessionStore::new();
        let observer = store.clone();
        store.save(&[ChatSession::new()]).expect("save");
        assert_eq!(observer.load().expect("load").len(), 1);
        assert!(observer.raw().is_some());
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let store = MemorySessionStore::new();
        assert!(store.load().expect("load").is_empty());
        assert!(store.raw().is_none());
    }
}
