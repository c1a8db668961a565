//! Test utilities for Healthchat
//!
//! This module provides common test helpers: temporary directories, stores
//! backed by them, prebuilt sessions, and assertion helpers.

use crate::config::Config;
use crate::error::Result;
use crate::session::{ChatSession, Message, Role};
use crate::storage::SledSessionStore;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// The directory is removed when the returned value is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Open a sled store inside `dir`
pub fn temp_sled_store(dir: &TempDir) -> SledSessionStore {
    SledSessionStore::open(dir.path().join("history.sled")).expect("Failed to open sled store")
}

/// Build a session from `(role, text)` pairs
///
/// The title is derived from the first user message, as a send would.
pub fn session_with_messages(turns: &[(Role, &str)]) -> ChatSession {
    let mut session = ChatSession::new();
    for (role, text) in turns {
        if *role == Role::User {
            session.apply_title_from(text);
        }
        session.messages.push(Message::new(*role, *text));
    }
    session
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Configuration that needs no credentials and writes under `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "fake".to_string();
    config.storage.path = Some(dir.path().join("history.sled"));
    config
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
provider:
  type: fake
  gemini:
    model: gemini-2.5-flash
    timeout_seconds: 30

chat:
  empty_response: placeholder
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptyResponsePolicy;
    use crate::error::HealthchatError;
    use crate::storage::SessionStore;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_temp_sled_store_round_trips() {
        let dir = temp_dir();
        let store = temp_sled_store(&dir);
        let session = session_with_messages(&[(Role::User, "Hi"), (Role::Model, "Hello")]);
        store.save(std::slice::from_ref(&session)).unwrap();
        assert_eq!(store.load().unwrap(), vec![session]);
    }

    #[test]
    fn test_session_with_messages_sets_title() {
        let session = session_with_messages(&[(Role::User, "Sleep tips"), (Role::Model, "...")]);
        assert_eq!(session.title, "Sleep tips");
        assert_eq!(session.messages.len(), 2);
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(HealthchatError::Config("test error message".into()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(HealthchatError::Config("different error".into()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config_validates() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert_eq!(config.provider.provider_type, "fake");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_config_yaml() {
        let config = Config::from_yaml(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.chat.empty_response, EmptyResponsePolicy::Placeholder);
    }
}
