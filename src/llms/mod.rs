//! LLM completion gateways.
//!
//! [`base_llm`] defines the [`CompletionGateway`] contract the resolver
//! consumes; [`providers`] holds concrete HTTP backends.

pub mod base_llm;
pub mod providers;

#[cfg(test)]
pub(crate) mod testing;

pub use base_llm::{ChatMessage, Completion, CompletionChoice, CompletionGateway, GatewayError, Role};
