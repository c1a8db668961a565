//! Session lifecycle and the streamed message-send workflow
//!
//! [`SessionManager`] owns the in-memory session list and is the only writer
//! of the history store. Every discrete state transition ends with an
//! explicit [`commit`](SessionManager::commit) that persists the whole list,
//! so storage never lags memory by more than one fragment.
//!
//! Storage and model failures never escape the manager: a failed load yields
//! an empty list, a failed save is logged, and a failed reply becomes
//! [`FALLBACK_RESPONSE`] in the conversation.

use crate::config::EmptyResponsePolicy;
use crate::error::Result;
use crate::providers::{history_from_messages, ChatTurn, ModelClient};
use crate::session::types::{ChatSession, Message, SessionSummary};
use crate::storage::SessionStore;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Model message added when a reply fails
pub const FALLBACK_RESPONSE: &str = "Sorry, I encountered an error. Please try again.";

/// State change notifications for a presentation layer
///
/// Sent after the corresponding change has been committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new session was prepended to the list
    SessionCreated {
        /// Id of the new session
        session_id: String,
    },
    /// A session was removed
    SessionDeleted {
        /// Id of the removed session
        session_id: String,
    },
    /// The active session changed
    ActiveChanged {
        /// New active id, `None` when deselected
        session_id: Option<String>,
    },
    /// A message was appended to a session
    MessageAppended {
        /// Session that received the message
        session_id: String,
        /// The appended message
        message: Message,
    },
    /// A streaming model message received more text
    MessageUpdated {
        /// Session holding the message
        session_id: String,
        /// Id of the updated message
        message_id: String,
        /// Full accumulated text
        text: String,
    },
    /// The loading flag flipped
    LoadingChanged(bool),
}

/// How a streamed reply ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReplyOutcome {
    /// At least one fragment arrived
    Streamed,
    /// The stream finished without yielding anything
    Empty,
}

/// Owner of chat sessions, the active selection, and the loading flag
///
/// Sessions are kept most-recent-first. `send_message` takes `&mut self`,
/// so sends on one manager are serialized; share a manager between tasks
/// through `tokio::sync::Mutex` to queue them.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use healthchat::providers::{FakeModelClient, ScriptedReply};
/// use healthchat::session::SessionManager;
/// use healthchat::storage::MemorySessionStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let client = FakeModelClient::with_replies([ScriptedReply::fragments(["Hel", "lo"])]);
/// let mut manager = SessionManager::new(Box::new(MemorySessionStore::new()), Arc::new(client));
///
/// let session_id = manager.send_message("Hi there", None).await;
/// let session = manager.active_session().unwrap();
/// assert_eq!(session.id, session_id);
/// assert_eq!(session.title, "Hi there");
/// assert_eq!(session.messages[1].text, "Hello");
/// assert!(!manager.is_loading());
/// # }
/// ```
pub struct SessionManager {
    sessions: Vec<ChatSession>,
    active_session_id: Option<String>,
    is_loading: bool,
    store: Box<dyn SessionStore>,
    client: Arc<dyn ModelClient>,
    empty_response: EmptyResponsePolicy,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionManager {
    /// Create a manager and load persisted sessions
    ///
    /// Load failures are logged and leave the manager with no sessions.
    /// Streaming flags left behind by an interrupted run are cleared.
    pub fn new(store: Box<dyn SessionStore>, client: Arc<dyn ModelClient>) -> Self {
        let mut sessions = match store.load() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::error!("Failed to load chat history: {:#}", e);
                Vec::new()
            }
        };

        for session in sessions.iter_mut().filter(|s| s.is_streaming.is_some()) {
            tracing::debug!("Clearing stale streaming flag on session {}", session.id);
            session.is_streaming = None;
        }

        tracing::info!("Loaded {} chat sessions", sessions.len());

        Self {
            sessions,
            active_session_id: None,
            is_loading: false,
            store,
            client,
            empty_response: EmptyResponsePolicy::default(),
            events: None,
        }
    }

    /// Set the handling of replies that produce no text
    pub fn with_empty_response_policy(mut self, policy: EmptyResponsePolicy) -> Self {
        self.empty_response = policy;
        self
    }

    /// Receive [`SessionEvent`]s from now on
    ///
    /// Replaces any earlier subscription.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// All sessions, most recent first
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    /// Listing view of all sessions
    pub fn summaries(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(ChatSession::summary).collect()
    }

    /// Session with the given id
    pub fn session(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Currently selected id, which may not resolve to a session
    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    /// Session the active id refers to, if it exists
    pub fn active_session(&self) -> Option<&ChatSession> {
        self.active_session_id
            .as_deref()
            .and_then(|id| self.session(id))
    }

    /// Whether a reply is being generated
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Create an empty session, prepend it, and make it active
    pub fn create_new_session(&mut self) -> ChatSession {
        let session = ChatSession::new();
        tracing::info!("Created session {}", session.id);

        self.sessions.insert(0, session.clone());
        self.commit();
        self.emit(SessionEvent::SessionCreated {
            session_id: session.id.clone(),
        });
        self.set_active(Some(session.id.clone()));

        session
    }

    /// Make `id` the active session
    ///
    /// The id is not checked; an unknown id simply resolves to no active
    /// session.
    pub fn select_session(&mut self, id: &str) {
        self.set_active(Some(id.to_string()));
    }

    /// Deselect the active session so the next send starts a new one
    pub fn start_new_chat(&mut self) {
        self.set_active(None);
    }

    /// Remove a session and its messages
    ///
    /// Clears the active selection if it pointed at `id`. Unknown ids are a
    /// no-op.
    pub fn delete_session(&mut self, id: &str) {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);

        if self.sessions.len() != before {
            tracing::info!("Deleted session {}", id);
            self.commit();
            self.emit(SessionEvent::SessionDeleted {
                session_id: id.to_string(),
            });
        } else {
            tracing::debug!("Delete ignored, no session {}", id);
        }

        if self.active_session_id.as_deref() == Some(id) {
            self.set_active(None);
        }
    }

    /// Send a user message and stream the model's reply into the session
    ///
    /// The target is `session_id` when given, otherwise the active session;
    /// if neither resolves, a new session is created. Every fragment is
    /// committed as it arrives. Model failures are absorbed into a
    /// [`FALLBACK_RESPONSE`] message. The loading flag is cleared on every
    /// exit path.
    ///
    /// Returns the id of the session the message went to.
    pub async fn send_message(&mut self, text: &str, session_id: Option<&str>) -> String {
        let had_active = self.active_session_id.is_some();

        let target = session_id
            .map(str::to_string)
            .or_else(|| self.active_session_id.clone())
            .filter(|id| self.session(id).is_some());

        let session_id = match target {
            Some(id) => id,
            None => self.create_new_session().id,
        };

        let user_message = Message::user(text);
        if let Some(session) = self.session_mut(&session_id) {
            if session.apply_title_from(text) {
                tracing::debug!("Session {} titled '{}'", session.id, session.title);
            }
            session.messages.push(user_message.clone());
        }
        self.commit();
        self.emit(SessionEvent::MessageAppended {
            session_id: session_id.clone(),
            message: user_message,
        });

        if !had_active {
            self.set_active(Some(session_id.clone()));
        }

        self.set_loading(true);

        let history = self
            .session(&session_id)
            .map(|s| history_from_messages(&s.messages))
            .unwrap_or_default();

        match self.stream_reply(&session_id, &history, text).await {
            Ok(ReplyOutcome::Streamed) => {}
            Ok(ReplyOutcome::Empty) => match self.empty_response {
                EmptyResponsePolicy::Ignore => {
                    tracing::warn!("Model returned no text for session {}", session_id);
                }
                EmptyResponsePolicy::Placeholder => {
                    tracing::warn!(
                        "Model returned no text for session {}, adding placeholder",
                        session_id
                    );
                    self.append_message(&session_id, Message::model(FALLBACK_RESPONSE));
                }
            },
            Err(e) => {
                tracing::error!("Error sending message: {:#}", e);
                self.append_message(&session_id, Message::model(FALLBACK_RESPONSE));
            }
        }

        self.finish_streaming(&session_id);
        self.set_loading(false);

        session_id
    }

    /// Consume the model stream, patching one model message in place
    async fn stream_reply(
        &mut self,
        session_id: &str,
        history: &[ChatTurn],
        text: &str,
    ) -> Result<ReplyOutcome> {
        tracing::debug!(
            "Requesting reply from {} with {} turns",
            self.client.name(),
            history.len()
        );
        let mut stream = self.client.stream(history, text).await?;

        let mut full_response = String::new();
        let mut model_message_id: Option<String> = None;

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            full_response.push_str(&fragment);
            tracing::debug!("Received fragment of {} bytes", fragment.len());

            match &model_message_id {
                None => {
                    let message = Message::model(full_response.clone());
                    model_message_id = Some(message.id.clone());
                    if let Some(session) = self.session_mut(session_id) {
                        session.is_streaming = Some(true);
                    }
                    self.append_message(session_id, message);
                }
                Some(message_id) => {
                    self.update_message_text(session_id, message_id, &full_response);
                }
            }
        }

        Ok(if model_message_id.is_some() {
            ReplyOutcome::Streamed
        } else {
            ReplyOutcome::Empty
        })
    }

    /// Append a message to a session and commit
    fn append_message(&mut self, session_id: &str, message: Message) {
        let Some(session) = self.session_mut(session_id) else {
            tracing::warn!("Dropping message for missing session {}", session_id);
            return;
        };
        session.messages.push(message.clone());
        self.commit();
        self.emit(SessionEvent::MessageAppended {
            session_id: session_id.to_string(),
            message,
        });
    }

    /// Replace the text of one message, found by id, and commit
    fn update_message_text(&mut self, session_id: &str, message_id: &str, text: &str) {
        let Some(message) = self
            .session_mut(session_id)
            .and_then(|s| s.message_mut(message_id))
        else {
            tracing::warn!("Message {} vanished from session {}", message_id, session_id);
            return;
        };
        message.text = text.to_string();
        self.commit();
        self.emit(SessionEvent::MessageUpdated {
            session_id: session_id.to_string(),
            message_id: message_id.to_string(),
            text: text.to_string(),
        });
    }

    fn finish_streaming(&mut self, session_id: &str) {
        let was_streaming = self
            .session_mut(session_id)
            .map(|s| s.is_streaming.take().is_some())
            .unwrap_or(false);
        if was_streaming {
            self.commit();
        }
    }

    /// Persist the full session list
    ///
    /// Save failures are logged; memory stays the source of truth.
    pub fn commit(&self) {
        if let Err(e) = self.store.save(&self.sessions) {
            tracing::error!("Failed to save chat history: {:#}", e);
        }
    }

    fn session_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    fn set_active(&mut self, session_id: Option<String>) {
        if self.active_session_id == session_id {
            return;
        }
        self.active_session_id = session_id.clone();
        self.emit(SessionEvent::ActiveChanged { session_id });
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.emit(SessionEvent::LoadingChanged(loading));
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is rendering.
            let _ = tx.send(event);
        }
    }
}
