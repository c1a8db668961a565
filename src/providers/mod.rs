//! Model client module for Healthchat
//!
//! This module contains the model client abstraction and its
//! implementations: the Gemini API client and a scripted fake.

pub mod base;
pub mod fake;
pub mod gemini;

pub use base::{history_from_messages, ChatTurn, FragmentStream, ModelClient};
pub use fake::{FakeModelClient, RecordedRequest, ScriptedReply};
pub use gemini::GeminiClient;

use crate::config::ProviderConfig;
use crate::error::{HealthchatError, Result};
use std::sync::Arc;

/// Provider types accepted in configuration
pub const SUPPORTED_PROVIDERS: [&str; 2] = ["gemini", "fake"];

/// Create a model client based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration
/// * `provider_override` - Optional provider type replacing `config.provider_type`
///
/// # Errors
///
/// Returns error if the provider type is unknown or the client cannot be
/// initialized (for example, no Gemini API key is set)
///
/// # Examples
///
/// ```
/// use healthchat::config::ProviderConfig;
/// use healthchat::providers::create_client;
///
/// let config = ProviderConfig::default();
/// let client = create_client(&config, Some("fake")).unwrap();
/// assert_eq!(client.name(), "fake");
/// ```
pub fn create_client(
    config: &ProviderConfig,
    provider_override: Option<&str>,
) -> Result<Arc<dyn ModelClient>> {
    let provider_type = provider_override.unwrap_or(&config.provider_type);

    match provider_type {
        "gemini" => Ok(Arc::new(GeminiClient::from_env(config.gemini.clone())?)),
        "fake" => Ok(Arc::new(FakeModelClient::new())),
        _ => Err(HealthchatError::Provider(format!(
            "Unknown provider type: {}",
            provider_type
        ))
        .into()),
    }
}
