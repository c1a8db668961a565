//! Chat sessions and the message-send workflow
//!
//! [`types`] holds the persisted data model; [`manager`] owns the session
//! list and drives replies from the model client.

pub mod manager;
pub mod types;

pub use manager::{SessionEvent, SessionManager, FALLBACK_RESPONSE};
pub use types::{
    derive_title, find_session_by_prefix, ChatSession, Message, Role, SessionSummary,
    DEFAULT_TITLE, TITLE_ELLIPSIS, TITLE_MAX_CHARS,
};
