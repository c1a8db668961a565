//! Scripted in-process model client
//!
//! [`FakeModelClient`] replays queued replies instead of calling a network
//! service. Tests use it to drive the session manager through exact fragment
//! sequences and failures; the `fake` provider type uses it for offline
//! demos.
//!
//! # Example
//!
//! ```
//! use futures::StreamExt;
//! use healthchat::providers::{FakeModelClient, ModelClient, ScriptedReply};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = FakeModelClient::new();
//! client.push_reply(ScriptedReply::fragments(["Hel", "lo"]));
//!
//! let mut stream = client.stream(&[], "hi").await.unwrap();
//! assert_eq!(stream.next().await.unwrap().unwrap(), "Hel");
//! assert_eq!(stream.next().await.unwrap().unwrap(), "lo");
//! assert!(stream.next().await.is_none());
//! assert_eq!(client.requests()[0].new_message, "hi");
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{HealthchatError, Result};
use crate::prompts::{DISCLAIMER, DISCLAIMER_SEPARATOR};
use crate::providers::{ChatTurn, FragmentStream, ModelClient};

/// One queued reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Yield these fragments, then finish normally
    Fragments(Vec<String>),
    /// Yield these fragments, then fail with the message
    FailAfter(Vec<String>, String),
    /// Fail before any fragment is produced
    FailToStart(String),
}

impl ScriptedReply {
    /// Reply made of the given fragments
    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fragments(fragments.into_iter().map(Into::into).collect())
    }
}

/// A request the fake client received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// History passed to [`ModelClient::stream`]
    pub history: Vec<ChatTurn>,
    /// New user message passed to [`ModelClient::stream`]
    pub new_message: String,
}

/// Model client that replays scripted replies
///
/// Clones share the reply queue and the request log. When the queue is
/// empty a canned reply ending with the persona disclaimer is produced.
#[derive(Debug, Clone, Default)]
pub struct FakeModelClient {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeModelClient {
    /// Create a client with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with the given replies queued in order
    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    /// Queue another reply
    pub fn push_reply(&self, reply: ScriptedReply) {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(reply);
        }
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn next_reply(&self, new_message: &str) -> ScriptedReply {
        self.replies
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| canned_reply(new_message))
    }
}

/// Offline answer split into word-sized fragments
fn canned_reply(new_message: &str) -> ScriptedReply {
    let text = format!(
        "I'm running offline, so I can't look into \"{}\" right now.\n\n{} \n {}",
        new_message, DISCLAIMER_SEPARATOR, DISCLAIMER
    );
    ScriptedReply::Fragments(text.split_inclusive(' ').map(str::to_string).collect())
}

#[async_trait]
impl ModelClient for FakeModelClient {
    async fn stream(&self, history: &[ChatTurn], new_message: &str) -> Result<FragmentStream> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(RecordedRequest {
                history: history.to_vec(),
                new_message: new_message.to_string(),
            });
        }

        let items: Vec<Result<String>> = match self.next_reply(new_message) {
            ScriptedReply::FailToStart(message) => {
                return Err(HealthchatError::Provider(message).into());
            }
            ScriptedReply::Fragments(fragments) => fragments.into_iter().map(Ok).collect(),
            ScriptedReply::FailAfter(fragments, message) => fragments
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(
                    HealthchatError::StreamInterrupted(message).into()
                )))
                .collect(),
        };

        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn name(&self) -> &str {
        "fake"
    }
}
