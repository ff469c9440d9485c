//! Completion model trait and chat message types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A role-tagged message sent to a [`CompletionModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A chat completion backend.
///
/// The concierge never retries; retry policy, if any, belongs to the
/// implementation.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Generate a single text reply for an ordered list of messages.
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;
}
