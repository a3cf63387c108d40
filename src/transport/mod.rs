//! Chat transport: where inbound events come from and replies go.
//!
//! The dispatcher only needs the outbound half ([`ChatTransport::reply`]).
//! Inbound delivery is push-based: the HTTP surface in [`crate::server`]
//! converts transport payloads into [`InboundEvent`]s and queues them.

pub mod slack;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use slack::SlackTransport;

/// A single inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Transport-assigned id, stable across redeliveries.
    pub event_id: String,
    /// Set when the bot itself authored the message.
    #[serde(default)]
    pub from_bot: bool,
    /// Originating user; replies are addressed here.
    pub user_id: String,
    /// Raw message text.
    pub text: String,
}

impl InboundEvent {
    pub fn new(
        event_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            from_bot: false,
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

/// Errors raised while posting a reply.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transport-level failure.
    #[error("reply request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The chat API rejected the reply.
    #[error("chat API error: {error}")]
    Api { error: String },
}

/// Outbound side of the chat surface.
#[async_trait]
pub trait ChatTransport: Send + Sync + std::fmt::Debug {
    /// Post `text` to `user_id`.
    async fn reply(&self, user_id: &str, text: &str) -> Result<(), TransportError>;
}
