//! Model backend abstraction
//!
//! Unified interface for chat-completion backends. The default (and only
//! built-in) backend speaks the Ollama HTTP API on localhost.

pub mod ollama;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message in a conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Errors from the model backend.
///
/// `Unreachable` is kept distinct so callers can tell "start your inference
/// server" apart from a genuine API failure.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("model backend unreachable at {url} — is the inference server running? (try `ollama serve`)")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("model backend returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed backend response: {0}")]
    InvalidResponse(String),

    #[error("request to model backend failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProviderError {
    /// True when the failure is the backend being down rather than a bad
    /// request, so callers can surface "transient, retry" guidance.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Chat-completion backend. Implementations are synchronous from the
/// orchestration loop's perspective; any streaming happens underneath.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend identifier for logging
    fn name(&self) -> &str;

    /// Model identifier this provider is configured for
    fn model(&self) -> &str;

    /// Run one completion over the full transcript and return the
    /// assistant text.
    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError>;
}
