//! Slack Events API transport.
//!
//! Inbound: Slack POSTs envelopes to the bot's webhook. Every request carries
//! an HMAC-SHA256 signature made with the app's signing secret, checked by
//! [`SignatureVerifier`] before the body is parsed. `url_verification`
//! envelopes are answered with their challenge; `event_callback` envelopes
//! carrying a message are mapped to [`InboundEvent`]s. Slack redelivers an
//! envelope with the same `event_id` when it does not get a timely 200, which
//! is why the event id is the ledger key.
//!
//! Outbound: replies go through `chat.postMessage`, addressed to the user id
//! (Slack opens the bot's DM with that user).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use super::{ChatTransport, InboundEvent, TransportError};

/// Default Slack Web API base.
pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Header carrying `v0=<hex hmac>`.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
/// Header carrying the request's unix timestamp in seconds.
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
/// Requests older (or newer) than this are rejected as replays.
pub const DEFAULT_REPLAY_WINDOW_SECS: i64 = 5 * 60;

const SIGNATURE_VERSION: &str = "v0";

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Request signing
// ---------------------------------------------------------------------------

/// Why a webhook request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("invalid request timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("request timestamp outside the replay window")]
    Stale,

    #[error("malformed signature")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,
}

/// Checks Slack's `v0` request signatures: HMAC-SHA256 over
/// `v0:{timestamp}:{raw body}` keyed with the signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    replay_window: chrono::Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("replay_window", &self.replay_window)
            .finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            secret: signing_secret.into().into_bytes(),
            replay_window: chrono::Duration::seconds(DEFAULT_REPLAY_WINDOW_SECS),
        }
    }

    pub fn with_replay_window(mut self, replay_window: chrono::Duration) -> Self {
        self.replay_window = replay_window;
        self
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| SignatureError::Malformed)?;
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }

    /// Produce the `X-Slack-Signature` value for a request.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{}={}", SIGNATURE_VERSION, hex::encode(digest)))
    }

    /// Verify a request against the current clock.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        self.verify_at(timestamp, signature, body, Utc::now())
    }

    /// Verify a request as if received at `now`.
    pub fn verify_at(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

        let sent_at = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_string()))?;
        if now.timestamp().saturating_sub(sent_at).saturating_abs() > self.replay_window.num_seconds() {
            return Err(SignatureError::Stale);
        }

        let hex_digest = signature
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(SignatureError::Malformed)?;
        let expected = hex::decode(hex_digest).map_err(|_| SignatureError::Malformed)?;

        self.mac(timestamp, body)?
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

// ---------------------------------------------------------------------------
// Inbound envelopes
// ---------------------------------------------------------------------------

/// Top-level Events API payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    /// Endpoint ownership check sent when the webhook URL is configured.
    UrlVerification { challenge: String },
    /// A subscribed event.
    EventCallback {
        event_id: String,
        event: SlackEvent,
    },
    /// Any other envelope type (e.g. `app_rate_limited`).
    #[serde(other)]
    Unsupported,
}

/// The inner event of an `event_callback` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    /// `im` for direct messages; `channel`, `group` or `mpim` otherwise.
    #[serde(default)]
    pub channel_type: Option<String>,
}

/// Who the bot is, as reported by `auth.test`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BotIdentity {
    pub user_id: String,
    #[serde(default)]
    pub bot_id: Option<String>,
}

impl SlackEvent {
    /// Whether the bot itself authored this event.
    pub fn is_from(&self, identity: &BotIdentity) -> bool {
        let own_bot = match (&self.bot_id, &identity.bot_id) {
            (Some(event_bot), Some(own)) => event_bot == own,
            _ => false,
        };
        own_bot || self.user.as_deref() == Some(identity.user_id.as_str())
    }
}

/// Map a message-bearing callback to an [`InboundEvent`].
///
/// Direct messages arrive as `message` events with `channel_type: im`;
/// channel requests arrive as `app_mention`. Channel `message` events are
/// skipped since Slack also sends an `app_mention` for the same post.
/// Returns `None` for anything else and for events without a user.
pub fn to_inbound(
    event_id: &str,
    event: &SlackEvent,
    identity: &BotIdentity,
) -> Option<InboundEvent> {
    let wanted = match event.event_type.as_str() {
        "app_mention" => true,
        "message" => event.channel_type.as_deref() == Some("im"),
        _ => false,
    };
    if !wanted {
        return None;
    }
    let user_id = event.user.clone()?;
    Some(InboundEvent {
        event_id: event_id.to_string(),
        from_bot: event.is_from(identity),
        user_id,
        text: event.text.clone().unwrap_or_default(),
    })
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
}

/// `chat.postMessage` reply sink.
#[derive(Debug, Clone)]
pub struct SlackTransport {
    api_base: String,
    bot_token: String,
    client: reqwest::Client,
}

impl SlackTransport {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Look up the bot's own user and bot ids via `auth.test`.
    pub async fn identity(&self) -> Result<BotIdentity, TransportError> {
        let response: AuthTestResponse = self
            .client
            .post(format!("{}/auth.test", self.api_base))
            .bearer_auth(&self.bot_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.ok, response.user_id) {
            (true, Some(user_id)) => Ok(BotIdentity {
                user_id,
                bot_id: response.bot_id,
            }),
            _ => Err(TransportError::Api {
                error: response.error.unwrap_or_else(|| "unknown_error".to_string()),
            }),
        }
    }
}

#[async_trait]
impl ChatTransport for SlackTransport {
    async fn reply(&self, user_id: &str, text: &str) -> Result<(), TransportError> {
        let response: SlackApiResponse = self
            .client
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(&PostMessage {
                channel: user_id,
                text,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.ok {
            log::debug!("Posted reply to {}", user_id);
            Ok(())
        } else {
            Err(TransportError::Api {
                error: response.error.unwrap_or_else(|| "unknown_error".to_string()),
            })
        }
    }
}
