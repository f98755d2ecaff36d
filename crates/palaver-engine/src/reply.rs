//! Response normalization for the palaver engine.
//!
//! Completion backends answer in several shapes. This module names each
//! recognized shape and resolves a body to one of them in a fixed
//! priority order, so every case stays individually testable.

use serde_json::Value;

/// Recognized shapes of a completion response body, in resolution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyShape {
    /// `{"assistant": "..."}` as produced by the relay proxy.
    Assistant(String),
    /// OpenAI-style `choices[0].message.content`, trimmed.
    Choices(String),
    /// Legacy `{"reply": "..."}` field.
    Reply(String),
    /// The body carried an explicit `error` field.
    Error(String),
    /// Unrecognized body, serialized verbatim as a last resort.
    Passthrough(String),
}

impl ReplyShape {
    /// Resolve a success-status body to its shape. First match wins.
    pub fn classify(body: &Value) -> Self {
        if let Some(text) = body.get("assistant").and_then(Value::as_str) {
            return Self::Assistant(text.to_string());
        }
        if let Some(text) = body
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
        {
            return Self::Choices(text.trim().to_string());
        }
        if let Some(text) = body.get("reply").and_then(Value::as_str) {
            return Self::Reply(text.to_string());
        }
        if body.get("error").is_some() {
            let message = extract_error(body).unwrap_or_else(|| body.to_string());
            return Self::Error(message);
        }
        Self::Passthrough(body.to_string())
    }
}

/// Extract a human-readable error message from a response body.
///
/// Priority: a string `error` field, then `error.message`, then a
/// top-level `message` field. Returns `None` when none of them match;
/// callers fall back to the serialized body or the status line.
pub fn extract_error(body: &Value) -> Option<String> {
    if let Some(text) = body.get("error").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    if let Some(text) = body.pointer("/error/message").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    body.get("message")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
