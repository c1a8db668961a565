//! Gemini model client
//!
//! Streams replies from the Gemini `streamGenerateContent` endpoint using
//! server-sent events. Each SSE event carries a partial `GenerateContent`
//! response; the text of its candidate parts becomes one fragment.

use crate::config::GeminiConfig;
use crate::error::{HealthchatError, Result};
use crate::prompts::build_system_instruction;
use crate::providers::{ChatTurn, FragmentStream, ModelClient};
use crate::session::Role;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Environment variables consulted for the API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Gemini API client
///
/// # Examples
///
/// ```no_run
/// use healthchat::config::GeminiConfig;
/// use healthchat::providers::{ChatTurn, GeminiClient, ModelClient};
/// use futures::StreamExt;
///
/// # async fn example() -> healthchat::error::Result<()> {
/// let client = GeminiClient::new(GeminiConfig::default(), "my-api-key")?;
/// let history = vec![ChatTurn::user("How much water should I drink?")];
/// let mut stream = client.stream(&history, "How much water should I drink?").await?;
/// while let Some(fragment) = stream.next().await {
///     print!("{}", fragment?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    api_key: String,
    system_instruction: String,
}

/// Request body for `streamGenerateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// One streamed response chunk
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ErrorBody {
    fn describe(&self) -> String {
        let message = self.message.clone().unwrap_or_else(|| "unknown error".to_string());
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => format!("{}: {}", status, message),
            _ => message,
        }
    }
}

impl GeminiClient {
    /// Create a client for the configured model
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built or the key is empty
    pub fn new(config: GeminiConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(HealthchatError::MissingCredentials("gemini".to_string()).into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("healthchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HealthchatError::Provider(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
            system_instruction: build_system_instruction(),
        })
    }

    /// Create a client using the API key from the environment
    ///
    /// # Errors
    ///
    /// Returns `HealthchatError::MissingCredentials` if none of
    /// [`API_KEY_ENV_VARS`] is set
    pub fn from_env(config: GeminiConfig) -> Result<Self> {
        let api_key = resolve_api_key()?;
        Self::new(config, api_key)
    }

    /// Endpoint URL for streamed generation
    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the request body from history and the new message
    ///
    /// The history normally already ends with the new user turn; it is only
    /// appended when missing so the model does not see the question twice.
    fn build_request(&self, history: &[ChatTurn], new_message: &str) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.as_str().to_string()),
                parts: vec![Part {
                    text: turn.text.clone(),
                }],
            })
            .collect();

        let already_present = history
            .last()
            .map(|turn| turn.role == Role::User && turn.text == new_message)
            .unwrap_or(false);
        if !already_present {
            contents.push(Content {
                role: Some(Role::User.as_str().to_string()),
                parts: vec![Part {
                    text: new_message.to_string(),
                }],
            });
        }

        GenerateContentRequest {
            contents,
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: self.system_instruction.clone(),
                }],
            },
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn stream(&self, history: &[ChatTurn], new_message: &str) -> Result<FragmentStream> {
        let request = self.build_request(history, new_message);
        tracing::debug!(
            "Sending {} turns to Gemini model {}",
            request.contents.len(),
            self.config.model
        );

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| HealthchatError::Provider(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorWrapper>(&body)
                .map(|wrapper| wrapper.error.describe())
                .unwrap_or(body);
            tracing::error!("Gemini returned {}: {}", status, message);
            return Err(
                HealthchatError::Provider(format!("Gemini returned {}: {}", status, message))
                    .into(),
            );
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(parse_fragment_stream(response.bytes_stream(), tx));

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Read the API key from [`API_KEY_ENV_VARS`]
///
/// # Errors
///
/// Returns `HealthchatError::MissingCredentials` if no variable holds a
/// non-empty value
pub fn resolve_api_key() -> Result<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .ok_or_else(|| HealthchatError::MissingCredentials("gemini".to_string()).into())
}

/// Turn an SSE byte stream into text fragments
///
/// Runs until the body ends, a transport error occurs (forwarded as an
/// `Err` item), or the receiver is dropped. Carriage returns are dropped so
/// both `\n\n` and `\r\n\r\n` delimit events; events are decoded only once
/// complete, so multi-byte characters split across chunks survive.
pub async fn parse_fragment_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>>,
    tx: mpsc::UnboundedSender<Result<String>>,
) {
    let mut buffer: Vec<u8> = Vec::new();

    tokio::pin!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk = match chunk_result {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(Err(HealthchatError::StreamInterrupted(e.to_string()).into()));
                return;
            }
        };

        buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        while let Some(pos) = find_event_boundary(&buffer) {
            let block: Vec<u8> = buffer.drain(..pos + 2).collect();
            let event = String::from_utf8_lossy(&block[..pos]);
            if let Some(item) = fragment_from_event(&event) {
                let failed = item.is_err();
                if tx.send(item).is_err() || failed {
                    return;
                }
            }
        }
    }

    if !buffer.is_empty() {
        let event = String::from_utf8_lossy(&buffer);
        if let Some(item) = fragment_from_event(&event) {
            let _ = tx.send(item);
        }
    }
}

fn find_event_boundary(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Extract the fragment carried by one SSE event block
///
/// Returns `None` for events without text (keep-alives, metadata-only
/// chunks) and `Some(Err(..))` when the event reports an API error or cannot
/// be decoded.
fn fragment_from_event(event_block: &str) -> Option<Result<String>> {
    let data_lines: Vec<&str> = event_block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect();

    if data_lines.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let chunk: GenerateContentResponse = match serde_json::from_str(&data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(HealthchatError::StreamInterrupted(format!(
                "malformed Gemini event: {}",
                e
            ))
            .into()))
        }
    };

    if let Some(error) = chunk.error {
        return Some(Err(HealthchatError::Provider(error.describe()).into()));
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        None
    } else {
        Some(Ok(text))
    }
}
