//! Chat history persistence
//!
//! The whole session list lives in a single key-value slot as a JSON array
//! (most-recent-first). Stores only move bytes in and out of that slot; the
//! policy for absorbing failures lives in the session manager.

use crate::error::{HealthchatError, Result};
use crate::session::ChatSession;
use directories::ProjectDirs;
use std::path::PathBuf;

pub mod memory;
pub mod sled_store;

pub use memory::MemorySessionStore;
pub use sled_store::SledSessionStore;

/// Fixed key holding the serialized session list
pub const CHAT_HISTORY_KEY: &str = "healthcare_chat_history";

/// Durable storage for the ordered session list
///
/// `load` returns an empty list when nothing has been saved yet and an
/// error when the stored bytes cannot be read or decoded.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Read the stored session list
    fn load(&self) -> Result<Vec<ChatSession>>;

    /// Replace the stored session list
    fn save(&self, sessions: &[ChatSession]) -> Result<()>;
}

/// Encode a session list for the history slot
pub fn encode_sessions(sessions: &[ChatSession]) -> Result<Vec<u8>> {
    serde_json::to_vec(sessions)
        .map_err(|e| HealthchatError::Storage(format!("Serialization failed: {}", e)).into())
}

/// Decode the history slot contents
pub fn decode_sessions(bytes: &[u8]) -> Result<Vec<ChatSession>> {
    serde_json::from_slice(bytes)
        .map_err(|e| HealthchatError::Storage(format!("Deserialization failed: {}", e)).into())
}

/// Default on-disk location of the history database
///
/// # Errors
///
/// Returns `HealthchatError::Storage` if the platform data directory cannot
/// be determined.
pub fn default_history_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "healthchat", "healthchat").ok_or_else(|| {
        HealthchatError::Storage("Could not determine data directory".to_string())
    })?;
    Ok(proj_dirs.data_dir().join("history.sled"))
}
