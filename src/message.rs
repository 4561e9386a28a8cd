//! Message types for conversation history.
//!
//! A message is created once and never rewritten, with one exception: an
//! assistant message starts as an empty pending placeholder and is patched
//! in place exactly once when the backend reply (or error) lands.

use crate::provider::Provider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Backend that produced (or will produce) this message
    pub provider: Provider,
    /// True from placeholder creation until the reply or error lands
    #[serde(default)]
    pub is_loading: bool,
    /// True iff the backend call failed
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    fn new(role: Role, provider: Provider, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
            provider,
            is_loading: false,
            is_error: false,
        }
    }

    /// Create a user message
    pub fn user(provider: Provider, content: impl Into<String>) -> Self {
        Self::new(Role::User, provider, content.into())
    }

    /// Create a system message
    pub fn system(provider: Provider, content: impl Into<String>) -> Self {
        Self::new(Role::System, provider, content.into())
    }

    /// Create an assistant placeholder awaiting its backend result
    pub fn pending_assistant(provider: Provider) -> Self {
        Self {
            is_loading: true,
            ..Self::new(Role::Assistant, provider, String::new())
        }
    }
}

/// Partial update merged into a message by [`ChatStore::patch`].
///
/// The orchestrator always sets all three fields together so the
/// pending -> resolved/failed transition is atomic from its perspective.
///
/// [`ChatStore::patch`]: crate::store::ChatStore::patch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub is_loading: Option<bool>,
    pub is_error: Option<bool>,
}

impl MessagePatch {
    /// Terminal patch for a successful backend reply
    pub fn resolved(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            is_loading: Some(false),
            is_error: Some(false),
        }
    }

    /// Terminal patch for a failed backend call
    pub fn failed(error_text: impl Into<String>) -> Self {
        Self {
            content: Some(error_text.into()),
            is_loading: Some(false),
            is_error: Some(true),
        }
    }

    /// Merge the set fields into `message`
    pub fn apply(&self, message: &mut Message) {
        if let Some(content) = &self.content {
            message.content = content.clone();
        }
        if let Some(is_loading) = self.is_loading {
            message.is_loading = is_loading;
        }
        if let Some(is_error) = self.is_error {
            message.is_error = is_error;
        }
    }
}
