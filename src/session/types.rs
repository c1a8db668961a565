//! Session and message data model
//!
//! These types are persisted verbatim as a JSON array, so field names and
//! encodings (camelCase keys, millisecond timestamps) are part of the
//! on-disk format.

use crate::error::{HealthchatError, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title every session starts with until its first user message
pub const DEFAULT_TITLE: &str = "New Chat";

/// Number of characters of the first user message kept in a derived title
pub const TITLE_MAX_CHARS: usize = 30;

/// Marker appended to titles that were cut short
pub const TITLE_ELLIPSIS: &str = "...";

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the person using the assistant
    User,
    /// Text generated by the model
    Model,
}

impl Role {
    /// Wire name of the role
    ///
    /// # Examples
    ///
    /// ```
    /// use healthchat::session::Role;
    ///
    /// assert_eq!(Role::Model.as_str(), "model");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,
    /// Who wrote the message
    pub role: Role,
    /// Message body; replaced wholesale while a model reply streams in
    pub text: String,
    /// Creation time, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message with a fresh id and the current time
    ///
    /// # Examples
    ///
    /// ```
    /// use healthchat::session::{Message, Role};
    ///
    /// let msg = Message::new(Role::User, "Hello");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.text, "Hello");
    /// ```
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            text: text.into(),
            timestamp: now_millis(),
        }
    }

    /// Creates a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates a model message
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }
}

/// One conversation thread with its own history and title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Unique session identifier
    pub id: String,
    /// Display title, derived from the first user message
    pub title: String,
    /// Messages in conversation order
    pub messages: Vec<Message>,
    /// Creation time, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Set while a model reply is being streamed into this session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_streaming: Option<bool>,
}

impl ChatSession {
    /// Creates an empty session titled [`DEFAULT_TITLE`]
    ///
    /// # Examples
    ///
    /// ```
    /// use healthchat::session::{ChatSession, DEFAULT_TITLE};
    ///
    /// let session = ChatSession::new();
    /// assert_eq!(session.title, DEFAULT_TITLE);
    /// assert!(session.messages.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            id: new_id(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now_millis(),
            is_streaming: None,
        }
    }

    /// Whether any user message has been recorded
    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }

    /// Derives the title from `text` when no user message exists yet
    ///
    /// Call before pushing the user message `text` belongs to. A session is
    /// titled once, even when its first message reads like the default.
    /// Returns `true` when the title changed.
    pub fn apply_title_from(&mut self, text: &str) -> bool {
        if self.has_user_message() {
            return false;
        }
        self.title = derive_title(text);
        true
    }

    /// Mutable access to a message by id
    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Whether a model reply is currently streaming into this session
    pub fn is_streaming(&self) -> bool {
        self.is_streaming.unwrap_or(false)
    }

    /// Lightweight view used by session listings
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            message_count: self.messages.len(),
            created_at: self.created_at,
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Listing entry for a stored session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Unique identifier for the session
    pub id: String,
    /// Session title
    pub title: String,
    /// Number of messages in the session
    pub message_count: usize,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// Builds a session title from the first user message
///
/// Messages of at most [`TITLE_MAX_CHARS`] characters are used as-is; longer
/// ones are cut to that many characters followed by [`TITLE_ELLIPSIS`].
///
/// # Examples
///
/// ```
/// use healthchat::session::derive_title;
///
/// assert_eq!(derive_title("Headache remedies"), "Headache remedies");
/// assert_eq!(
///     derive_title("What are the symptoms of the seasonal flu?"),
///     "What are the symptoms of the s..."
/// );
/// ```
pub fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}{}", head, TITLE_ELLIPSIS)
    } else {
        head
    }
}

/// Resolves a full id or unique id prefix to a session
///
/// An exact id match always wins. Otherwise the prefix must match exactly one
/// session.
///
/// # Errors
///
/// Returns `HealthchatError::SessionLookup` if nothing matches or the prefix
/// is ambiguous.
pub fn find_session_by_prefix<'a>(
    sessions: &'a [ChatSession],
    id_or_prefix: &str,
) -> Result<&'a ChatSession> {
    let needle = id_or_prefix.trim();
    if needle.is_empty() {
        return Err(HealthchatError::SessionLookup("empty session id".to_string()).into());
    }

    if let Some(exact) = sessions.iter().find(|s| s.id == needle) {
        return Ok(exact);
    }

    let matches: Vec<&ChatSession> = sessions.iter().filter(|s| s.id.starts_with(needle)).collect();
    match matches.as_slice() {
        [] => Err(HealthchatError::SessionLookup(format!("no session matches '{}'", needle)).into()),
        [only] => Ok(only),
        many => {
            let candidates: Vec<&str> = many.iter().map(|s| s.id.as_str()).collect();
            Err(HealthchatError::SessionLookup(format!(
                "'{}' is ambiguous: {}",
                needle,
                candidates.join(", ")
            ))
            .into())
        }
    }
}

/// Generates a new opaque identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time truncated to the millisecond precision used on disk
///
/// Truncating up front keeps in-memory values equal to what a save/load
/// cycle produces.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_text_kept_whole() {
        assert_eq!(derive_title("Flu symptoms"), "Flu symptoms");
    }

    #[test]
    fn test_derive_title_exactly_thirty_chars_has_no_ellipsis() {
        let text = "a".repeat(30);
        assert_eq!(derive_title(&text), text);
    }

    #[test]
    fn test_derive_title_long_text_truncated_with_ellipsis() {
        let text = "b".repeat(31);
        assert_eq!(derive_title(&text), format!("{}...", "b".repeat(30)));
    }

    #[test]
    fn test_derive_title_counts_chars_not_bytes() {
        let text = "é".repeat(31);
        let title = derive_title(&text);
        assert_eq!(title.chars().count(), 33);
        assert!(title.starts_with(&"é".repeat(30)));
    }

    #[test]
    fn test_apply_title_only_once() {
        let mut session = ChatSession::new();
        assert!(session.apply_title_from("first question"));
        session.messages.push(Message::user("first question"));
        assert!(!session.apply_title_from("second question"));
        assert_eq!(session.title, "first question");
    }

    #[test]
    fn test_first_message_matching_default_title_is_kept() {
        let mut session = ChatSession::new();
        assert!(session.apply_title_from(DEFAULT_TITLE));
        session.messages.push(Message::user(DEFAULT_TITLE));

        assert!(!session.apply_title_from("What about allergies?"));
        assert_eq!(session.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_model_messages_do_not_block_titling() {
        let mut session = ChatSession::new();
        session.messages.push(Message::model("Welcome back."));
        assert!(session.apply_title_from("Knee pain"));
        assert_eq!(session.title, "Knee pain");
    }

    #[test]
    fn test_session_serializes_with_camel_case_and_millis() {
        let mut session = ChatSession::new();
        session.messages.push(Message::user("hi"));
        let value = serde_json::to_value(&session).expect("serialize");

        assert!(value.get("createdAt").and_then(|v| v.as_i64()).is_some());
        assert!(value.get("isStreaming").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value["messages"][0]["timestamp"].is_i64());
    }

    #[test]
    fn test_session_deserializes_original_layout() {
        let json = r#"[{
            "id": "s-1",
            "title": "Sleep tips",
            "messages": [
                {"id": "m-1", "role": "user", "text": "Sleep tips", "timestamp": 1700000000000},
                {"id": "m-2", "role": "model", "text": "Try a routine.", "timestamp": 1700000001000}
            ],
            "createdAt": 1700000000000,
            "isStreaming": false
        }]"#;
        let sessions: Vec<ChatSession> = serde_json::from_str(json).expect("deserialize");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].messages[1].role, Role::Model);
        assert_eq!(sessions[0].created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(sessions[0].is_streaming, Some(false));
    }

    #[test]
    fn test_message_mut_finds_by_id() {
        let mut session = ChatSession::new();
        let msg = Message::model("Hel");
        let id = msg.id.clone();
        session.messages.push(Message::user("hi"));
        session.messages.push(msg);

        session.message_mut(&id).expect("found").text = "Hello".to_string();
        assert_eq!(session.messages[1].text, "Hello");
        assert!(session.message_mut("missing").is_none());
    }

    #[test]
    fn test_find_session_by_prefix() {
        let mut a = ChatSession::new();
        a.id = "abc-111".to_string();
        let mut b = ChatSession::new();
        b.id = "abd-222".to_string();
        let sessions = vec![a, b];

        assert_eq!(find_session_by_prefix(&sessions, "abc").unwrap().id, "abc-111");
        assert_eq!(
            find_session_by_prefix(&sessions, "abd-222").unwrap().id,
            "abd-222"
        );
        assert!(find_session_by_prefix(&sessions, "ab").is_err());
        assert!(find_session_by_prefix(&sessions, "zzz").is_err());
        assert!(find_session_by_prefix(&sessions, "  ").is_err());
    }

    #[test]
    fn test_now_millis_has_no_sub_millisecond_part() {
        let now = now_millis();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
