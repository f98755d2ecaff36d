//! Conversation state for the palaver engine.
//!
//! This module defines the message model and the order-preserving
//! conversation container that is replayed to the completion service
//! on every turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (persona and policy text).
    System,
    /// User message.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Timestamp of the message. Never sent on the wire.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Wire form of a message: exactly the fields the completion APIs accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    /// Role tag, serialized lowercase.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// An ordered conversation history.
///
/// The history starts with exactly one system message followed by one
/// assistant greeting, grows by appending, and never shrinks or reorders.
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Unique conversation ID.
    id: String,
    /// Messages in insertion order.
    messages: Vec<Message>,
    /// Creation timestamp.
    created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation seeded with the persona and greeting.
    pub fn new(persona: impl Into<String>, greeting: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: vec![Message::system(persona), Message::assistant(greeting)],
            created_at: Utc::now(),
        }
    }

    /// Append a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Full conversation history, in insertion order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The wire payload: every message, in order, reduced to role and
    /// content. No truncation or windowing.
    pub fn wire(&self) -> Vec<WireMessage> {
        self.messages.iter().map(WireMessage::from).collect()
    }

    /// Unique conversation ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of messages in the history.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty. Always false for a seeded conversation.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
