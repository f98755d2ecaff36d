//! palaver-engine: Headless engine for the palaver chat relay client
//!
//! This crate provides the core chat orchestration logic for palaver,
//! including:
//! - Conversation state (roles, messages, order-preserving history)
//! - The chat client with proxy-then-direct fallback and timeouts
//! - Response-shape normalization
//! - Credential discovery
//! - Configuration management

pub mod client;
pub mod config;
pub mod credentials;
pub mod message;
pub mod reply;

// Re-export commonly used types
pub use client::{ChatClient, ChatError, ChatReply, Route};
pub use config::{ClientConfig, ConfigError};
pub use credentials::{
    default_sources, CredentialProbe, CredentialSource, EnvSource, FileSource, CREDENTIAL_ENV_VARS,
    CREDENTIAL_FILE,
};
pub use message::{Conversation, Message, Role, WireMessage};
pub use reply::{extract_error, ReplyShape};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
