//! HTTP surface of the bot.
//!
//! Slack delivers events here; each accepted event is pushed onto the
//! dispatch queue consumed by [`crate::dispatch::Dispatcher::run`].
//!
//! # Endpoints
//!
//! - `GET  /health`       : liveness check
//! - `POST /slack/events` : Slack Events API webhook

pub mod routes;

pub use routes::{app_router, AppState};
