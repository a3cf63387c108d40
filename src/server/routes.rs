//! Axum route handlers for the rebot HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`       : `{"status": "ok", "version": ..., "service": "rebot"}`
//! - `POST /slack/events` : Slack Events API webhook (signed requests only)

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tower_http::trace::TraceLayer;

use crate::transport::slack::{
    to_inbound, BotIdentity, SignatureVerifier, SlackEnvelope, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
use crate::transport::InboundEvent;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Producer side of the dispatch queue.
    pub events: mpsc::Sender<InboundEvent>,
    /// Checks the Slack signing secret on every webhook request.
    pub verifier: Arc<SignatureVerifier>,
    /// The bot's own Slack identity, to flag self-originated events.
    pub identity: Arc<BotIdentity>,
}

impl AppState {
    pub fn new(
        events: mpsc::Sender<InboundEvent>,
        verifier: SignatureVerifier,
        identity: BotIdentity,
    ) -> Self {
        Self {
            events,
            verifier: Arc::new(verifier),
            identity: Arc::new(identity),
        }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/slack/events", post(slack_events_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health: liveness check.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "rebot",
    }))
}

/// POST /slack/events: acknowledge fast, dispatch in the background.
///
/// Requests must carry a valid Slack signature (401 otherwise). A 503 makes
/// Slack redeliver the envelope later; the ledger absorbs any
/// resulting duplicates.
async fn slack_events_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = state.verifier.verify(
        header_str(&headers, TIMESTAMP_HEADER),
        header_str(&headers, SIGNATURE_HEADER),
        &body,
    ) {
        tracing::warn!(error = %e, "Rejecting unsigned or forged Slack request");
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": e.to_string() }))).into_response();
    }

    let envelope: SlackEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed Slack envelope");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "malformed envelope" })))
                .into_response();
        }
    };

    match envelope {
        SlackEnvelope::UrlVerification { challenge } => {
            tracing::info!("Answering Slack url_verification");
            Json(json!({ "challenge": challenge })).into_response()
        }
        SlackEnvelope::EventCallback { event_id, event } => {
            let Some(inbound) = to_inbound(&event_id, &event, &state.identity) else {
                tracing::debug!(
                    event_id = %event_id,
                    event_type = %event.event_type,
                    "Ignoring non-message event"
                );
                return StatusCode::OK.into_response();
            };

            match state.events.try_send(inbound) {
                Ok(()) => {
                    tracing::debug!(event_id = %event_id, "Event queued");
                    StatusCode::OK.into_response()
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(event_id = %event_id, "Dispatch queue full, asking Slack to retry");
                    unavailable("dispatch queue full")
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::error!(event_id = %event_id, "Dispatch queue closed");
                    unavailable("dispatcher stopped")
                }
            }
        }
        SlackEnvelope::Unsupported => StatusCode::OK.into_response(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn unavailable(reason: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": reason })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const SECRET: &str = "test-signing-secret";

    fn state(events: mpsc::Sender<InboundEvent>) -> AppState {
        AppState::new(
            events,
            SignatureVerifier::new(SECRET),
            BotIdentity {
                user_id: "UBOT".to_string(),
                bot_id: Some("BBOT".to_string()),
            },
        )
    }

    fn post_signed(body: Value) -> Request<Body> {
        let body = body.to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = SignatureVerifier::new(SECRET)
            .sign(&timestamp, body.as_bytes())
            .unwrap();
        Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("Content-Type", "application/json")
            .header(TIMESTAMP_HEADER, timestamp)
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .unwrap()
    }

    fn direct_message(event_id: &str) -> Value {
        json!({
            "type": "event_callback",
            "event_id": event_id,
            "event": {"type": "message", "channel_type": "im", "user": "U123", "text": "What's 1 + 1?"}
        })
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (tx, _rx) = mpsc::channel(1);
        let app = app_router(state(tx));

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::VERSION);
        assert_eq!(json["service"], "rebot");
    }

    #[tokio::test]
    async fn test_url_verification_echoes_challenge() {
        let (tx, _rx) = mpsc::channel(1);
        let app = app_router(state(tx));

        let response = app
            .oneshot(post_signed(json!({
                "token": "t",
                "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
                "type": "url_verification"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["challenge"],
            "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P"
        );
    }

    #[tokio::test]
    async fn test_signed_message_is_queued() {
        let (tx, mut rx) = mpsc::channel(4);
        let app = app_router(state(tx));

        let response = app.oneshot(post_signed(direct_message("Ev1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued, InboundEvent::new("Ev1", "U123", "What's 1 + 1?"));
    }

    #[tokio::test]
    async fn test_unsigned_request_rejected() {
        let (tx, mut rx) = mpsc::channel(4);
        let app = app_router(state(tx));

        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("Content-Type", "application/json")
            .body(Body::from(direct_message("Ev1").to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forged_signature_rejected() {
        let (tx, mut rx) = mpsc::channel(4);
        let app = app_router(state(tx));

        let body = direct_message("Ev1").to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let forged = SignatureVerifier::new("wrong-secret")
            .sign(&timestamp, body.as_bytes())
            .unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header(TIMESTAMP_HEADER, timestamp)
            .header(SIGNATURE_HEADER, forged)
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "signature mismatch");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_replayed_request_rejected() {
        let (tx, mut rx) = mpsc::channel(4);
        let app = app_router(state(tx));

        let body = direct_message("Ev1").to_string();
        let timestamp = (chrono::Utc::now().timestamp() - 3600).to_string();
        let signature = SignatureVerifier::new(SECRET)
            .sign(&timestamp, body.as_bytes())
            .unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header(TIMESTAMP_HEADER, timestamp)
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_bad_request() {
        let (tx, _rx) = mpsc::channel(4);
        let app = app_router(state(tx));

        let response = app.oneshot(post_signed(json!({"no": "type"}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_message_event_acknowledged_not_queued() {
        let (tx, mut rx) = mpsc::channel(4);
        let app = app_router(state(tx));

        let response = app
            .oneshot(post_signed(json!({
                "type": "event_callback",
                "event_id": "Ev2",
                "event": {"type": "reaction_added", "user": "U123"}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_own_message_queued_as_self_originated() {
        let (tx, mut rx) = mpsc::channel(4);
        let app = app_router(state(tx));

        let response = app
            .oneshot(post_signed(json!({
                "type": "event_callback",
                "event_id": "Ev3",
                "event": {"type": "message", "channel_type": "im", "user": "UBOT",
                          "bot_id": "BBOT", "text": "The result is 2."}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(rx.try_recv().unwrap().from_bot);
    }

    #[tokio::test]
    async fn test_full_queue_returns_503() {
        let (tx, _rx) = mpsc::channel(1);
        tx.try_send(InboundEvent::new("Ev0", "U1", "first")).unwrap();
        let app = app_router(state(tx));

        let response = app.oneshot(post_signed(direct_message("Ev1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"], "dispatch queue full");
    }

    #[tokio::test]
    async fn test_closed_queue_returns_503() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let app = app_router(state(tx));

        let response = app.oneshot(post_signed(direct_message("Ev1"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
