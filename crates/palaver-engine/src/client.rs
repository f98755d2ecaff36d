//! Chat request/response orchestration for the palaver engine.
//!
//! This module implements the conversation client: it owns the message
//! history, relays it to the completion service, applies the timeout
//! budgets, and falls back from the relay proxy to a direct API call
//! when the proxy fails and a credential is available.

use crate::config::ClientConfig;
use crate::credentials::{default_sources, CredentialProbe, CredentialSource};
use crate::message::{Conversation, Message, WireMessage};
use crate::reply::{extract_error, ReplyShape};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Which path produced an assistant reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The relay proxy answered.
    Proxy,
    /// The direct completion API answered.
    Direct,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proxy => write!(f, "proxy"),
            Self::Direct => write!(f, "direct"),
        }
    }
}

/// Result of a successful chat turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Assistant text, appended to the history.
    pub content: String,
    /// Path that produced the reply.
    pub route: Route,
    /// Duration of the turn in milliseconds.
    pub duration_ms: u64,
}

/// Errors that can occur during a chat turn.
///
/// None of these poison the client; it remains usable for the next turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Empty or whitespace-only input. Never mutates the history.
    #[error("message is empty")]
    EmptyInput,

    /// The request could not be delivered.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request exceeded its timeout budget and was cancelled.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A response arrived but its body could not be read.
    #[error("response body was not readable: {0}")]
    OpaqueBody(#[source] reqwest::Error),

    /// A success response carried a body that was not valid JSON.
    #[error("response was not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The remote reported an error, by status code or an error field.
    #[error("remote error: {0}")]
    Remote(String),

    /// The remote nominally succeeded but produced no assistant text.
    #[error("model returned an empty reply")]
    EmptyReply,

    /// Direct-only mode with no credential configured or discoverable.
    #[error("no API credential configured")]
    MissingCredential,

    /// The proxy failed and no fallback credential was found.
    #[error("could not reach the assistant through the proxy ({0}); no fallback credential was found")]
    ProxyExhausted(String),
}

/// A chat client holding one conversation.
///
/// `send` takes `&mut self`, so one instance carries at most one request
/// at a time; callers serialize turns.
#[derive(Debug)]
pub struct ChatClient {
    config: ClientConfig,
    http: reqwest::Client,
    conversation: Conversation,
    credentials: CredentialProbe,
}

impl ChatClient {
    /// Create a client with the default credential sources.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_sources(config, default_sources())
    }

    /// Create a client with explicit credential sources.
    pub fn with_sources(config: ClientConfig, sources: Vec<Box<dyn CredentialSource>>) -> Self {
        let conversation = Conversation::new(&config.persona, &config.greeting);
        Self {
            http: reqwest::Client::new(),
            conversation,
            credentials: CredentialProbe::new(sources),
            config,
        }
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read-only view of the conversation.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Read-only view of the message history.
    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Send one user turn and return the assistant reply.
    ///
    /// The user turn is appended before any network attempt and is never
    /// rolled back; the assistant turn is appended only on a non-empty
    /// reply. The full accumulated history is replayed on every call.
    pub async fn send(&mut self, user_text: &str) -> Result<ChatReply, ChatError> {
        if user_text.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        self.conversation.push_user(user_text);
        let payload = self.conversation.wire();
        let start = Instant::now();

        let proxy_url = self.config.proxy_endpoint().map(ToString::to_string);
        let routed = match proxy_url {
            Some(proxy_url) => match self.call_proxy(&proxy_url, &payload).await {
                Ok(text) => Ok((text, Route::Proxy)),
                Err(proxy_err) => {
                    tracing::warn!(error = %proxy_err, "proxy request failed");
                    match self.credential() {
                        Some(key) => self
                            .call_direct(&key, &payload)
                            .await
                            .map(|text| (text, Route::Direct)),
                        None => Err(ChatError::ProxyExhausted(proxy_err.to_string())),
                    }
                }
            },
            None => match self.credential() {
                Some(key) => self
                    .call_direct(&key, &payload)
                    .await
                    .map(|text| (text, Route::Direct)),
                None => Err(ChatError::MissingCredential),
            },
        };

        let (content, route) = routed?;
        if content.trim().is_empty() {
            return Err(ChatError::EmptyReply);
        }

        self.conversation.push_assistant(content.as_str());

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(ChatReply {
            content,
            route,
            duration_ms,
        })
    }

    /// The fallback credential: inline config first, then the probe.
    fn credential(&mut self) -> Option<String> {
        if let Some(key) = self.config.inline_credential() {
            return Some(key.to_string());
        }
        self.credentials.probe()
    }

    /// One POST to the relay proxy, normalized to an assistant string.
    async fn call_proxy(&self, url: &str, messages: &[WireMessage]) -> Result<String, ChatError> {
        let body = json!({ "messages": messages });
        let budget = self.config.proxy_timeout_seconds;

        tracing::debug!(url, budget, "dispatching proxy request");
        let request = self.http.post(url).json(&body).send();
        let response = timeout(Duration::from_secs(budget), request)
            .await
            .map_err(|_| ChatError::Timeout(budget))?
            .map_err(ChatError::Network)?;

        let status = response.status();
        let raw = response.text().await.map_err(ChatError::OpaqueBody)?;

        if !status.is_success() {
            return Err(ChatError::Remote(remote_reason(&raw, status)));
        }

        let value: Value = serde_json::from_str(&raw).map_err(ChatError::InvalidJson)?;
        match ReplyShape::classify(&value) {
            ReplyShape::Assistant(text)
            | ReplyShape::Choices(text)
            | ReplyShape::Reply(text)
            | ReplyShape::Passthrough(text) => {
                if text.trim().is_empty() {
                    Err(ChatError::EmptyReply)
                } else {
                    Ok(text)
                }
            }
            ReplyShape::Error(message) => Err(ChatError::Remote(message)),
        }
    }

    /// One POST to the direct completion API.
    async fn call_direct(
        &self,
        credential: &str,
        messages: &[WireMessage],
    ) -> Result<String, ChatError> {
        let body = json!({
            "model": self.config.model.as_str(),
            "messages": messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });
        let budget = self.config.api_timeout_seconds;

        tracing::debug!(url = self.config.api_url.as_str(), budget, "dispatching direct request");
        let request = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(credential)
            .json(&body)
            .send();
        let response = timeout(Duration::from_secs(budget), request)
            .await
            .map_err(|_| ChatError::Timeout(budget))?
            .map_err(ChatError::Network)?;

        let status = response.status();
        let raw = response.text().await.map_err(ChatError::OpaqueBody)?;

        if !status.is_success() {
            return Err(ChatError::Remote(remote_reason(&raw, status)));
        }

        let value: Value = serde_json::from_str(&raw).map_err(ChatError::InvalidJson)?;
        let content = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        Ok(content)
    }
}

/// Build the failure reason for a non-success status.
///
/// A JSON body goes through the error-field ladder, then falls back to
/// the serialized body; a non-JSON body is used verbatim, or the status
/// line when the body is empty.
fn remote_reason(raw: &str, status: reqwest::StatusCode) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => extract_error(&value).unwrap_or_else(|| value.to_string()),
        Err(_) => {
            let text = raw.trim();
            if text.is_empty() {
                format!(
                    "{} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("error")
                )
            } else {
                text.to_string()
            }
        }
    }
}
