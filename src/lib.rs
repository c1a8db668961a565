//! Healthchat - streaming healthcare information assistant library
//!
//! This library provides the core of a healthcare chat client: persisted
//! chat sessions, the streamed message-send workflow, and the model client
//! boundary.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Chat data model and the session manager
//! - `storage`: Session history stores (sled, in-memory)
//! - `providers`: Model client abstraction and implementations (Gemini, fake)
//! - `prompts`: Healthcare assistant persona
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use healthchat::{Config, SessionManager};
//! use healthchat::commands::open_store;
//! use healthchat::providers::create_client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = create_client(&config.provider, None)?;
//!     let mut manager = SessionManager::new(open_store(&config, false)?, client);
//!     manager.send_message("How can I improve my sleep quality?", None).await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{HealthchatError, Result};
pub use session::{ChatSession, Message, Role, SessionEvent, SessionManager};

#[cfg(test)]
pub mod test_utils;
