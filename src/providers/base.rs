//! Base model client trait and common types
//!
//! This module defines the [`ModelClient`] trait every generative backend
//! implements, along with the history representation passed to it and the
//! fragment stream it returns.

use crate::error::Result;
use crate::session::{Message, Role};
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// One prior turn of the conversation as seen by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author of the turn
    pub role: Role,
    /// Text of the turn
    pub text: String,
}

impl ChatTurn {
    /// Creates a user turn
    ///
    /// # Examples
    ///
    /// ```
    /// use healthchat::providers::ChatTurn;
    /// use healthchat::session::Role;
    ///
    /// let turn = ChatTurn::user("Hello");
    /// assert_eq!(turn.role, Role::User);
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Creates a model turn
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
        }
    }
}

/// Converts stored messages into the role/text pairs sent to a model
pub fn history_from_messages(messages: &[Message]) -> Vec<ChatTurn> {
    messages.iter().map(ChatTurn::from).collect()
}

/// Lazy sequence of response text fragments
///
/// Each item is the next piece of generated text. An `Err` item ends the
/// response; consumers stop at the first one.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Generative backend that streams a reply to a conversation
///
/// Implementations apply their own system instruction when building the
/// request. Failures may happen when opening the stream or at any item.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use healthchat::error::Result;
/// use healthchat::providers::{ChatTurn, FragmentStream, ModelClient};
///
/// struct Echo;
///
/// #[async_trait]
/// impl ModelClient for Echo {
///     async fn stream(&self, _history: &[ChatTurn], new_message: &str) -> Result<FragmentStream> {
///         let reply = new_message.to_string();
///         Ok(Box::pin(futures::stream::iter(vec![Ok(reply)])))
///     }
/// }
/// ```
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Start a streamed reply
    ///
    /// # Arguments
    ///
    /// * `history` - Full conversation so far, ending with the new user turn
    /// * `new_message` - Text of the user message being answered
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be started
    async fn stream(&self, history: &[ChatTurn], new_message: &str) -> Result<FragmentStream>;

    /// Short name of the backend, used in logs
    fn name(&self) -> &str {
        "model"
    }
}
