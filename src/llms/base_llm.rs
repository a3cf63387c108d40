//! Completion gateway contract.
//!
//! The resolver only needs one operation from an LLM backend: send an ordered
//! list of role-tagged messages and get back a list of candidate completions.
//! Transport, authentication, timeouts and retry all live behind this trait.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single role-tagged message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub content: String,
}

/// The gateway's answer: zero or more choices, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub choices: Vec<CompletionChoice>,
}

impl Completion {
    /// A completion with a single choice.
    pub fn single(content: impl Into<String>) -> Self {
        Self {
            choices: vec![CompletionChoice {
                content: content.into(),
            }],
        }
    }

    /// Text of the first choice, if it has any non-whitespace content.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|c| c.content.as_str())
            .filter(|text| !text.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a completion gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No API key was configured.
    #[error("completion API key not set")]
    MissingApiKey,

    /// Transport-level failure (connect, timeout, body read).
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status after all retries.
    #[error("completion API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected shape.
    #[error("failed to decode completion response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// CompletionGateway trait
// ---------------------------------------------------------------------------

/// Narrow interface to an external chat-completion service.
///
/// Implementations own their retry and timeout policy; callers issue exactly
/// one `complete` per prompt and never retry.
#[async_trait]
pub trait CompletionGateway: Send + Sync + fmt::Debug {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send the ordered messages and return the service's choices.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Completion, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::system("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "hi"}));
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_first_text_skips_blank() {
        assert_eq!(Completion::default().first_text(), None);
        assert_eq!(Completion::single("  \n").first_text(), None);
        assert_eq!(Completion::single("ok").first_text(), Some("ok"));
    }

    #[test]
    fn test_first_text_uses_first_choice_only() {
        let completion = Completion {
            choices: vec![
                CompletionChoice {
                    content: String::new(),
                },
                CompletionChoice {
                    content: "second".to_string(),
                },
            ],
        };
        assert_eq!(completion.first_text(), None);
    }
}
