//! # rebot
//!
//! A chat bot that answers a free-text message by letting an LLM pick one
//! registered capability and write its argument, then invoking it.
//!
//! Each inbound event flows through:
//!
//! 1. the [`ledger`], which admits an event id at most once;
//! 2. the [`resolution`] protocol, which selects a capability from the
//!    [`capabilities`] registry and synthesizes its argument, two calls to an
//!    [`llms::CompletionGateway`];
//! 3. the capability handler;
//! 4. the [`transport`], which sends the result back to the user.
//!
//! [`dispatch::Dispatcher`] drives that sequence; [`server`] feeds it from the
//! Slack Events API.

pub mod capabilities;
pub mod config;
pub mod dispatch;
pub mod extensions;
pub mod ledger;
pub mod llms;
pub mod resolution;
pub mod server;
pub mod transport;

pub use capabilities::{Capability, Package, Registry};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use ledger::{EventLedger, InMemoryEventLedger, SqliteEventLedger};
pub use llms::CompletionGateway;
pub use resolution::Resolver;
pub use transport::{ChatTransport, InboundEvent};

/// Crate version, reported by `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
