//! Two-phase resolution protocol.
//!
//! Turns one free-text message into `(capability, argument)`:
//!
//! 1. **Select**: the catalog summary goes into a selection prompt; the
//!    model's enveloped answer is looked up as a qualified capability name.
//! 2. **Synthesize**: the chosen capability's full documentation goes into
//!    an argument prompt; the model's enveloped answer becomes the argument.
//!
//! Each phase is exactly one gateway round-trip. Nothing here retries; retry
//! policy belongs to the gateway.

pub mod parser;
pub mod prompts;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::capabilities::{Capability, Registry};
use crate::llms::{ChatMessage, CompletionGateway, GatewayError};

pub use parser::{extract_answer, strip_matching_quotes, ANSWER_MARKER, NOTES_MARKER};

/// Which phase of the protocol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Select,
    Argument,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Select => write!(f, "select"),
            Phase::Argument => write!(f, "argument"),
        }
    }
}

/// Errors raised while resolving a message.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The gateway returned no choices or only blank text.
    #[error("no completion returned during {phase} phase")]
    NoCompletion { phase: Phase },

    /// The model ignored the answer envelope or left the answer empty.
    #[error("malformed answer during {phase} phase: {response:?}")]
    MalformedAnswer { phase: Phase, response: String },

    /// The selected name is not in the registry.
    #[error("unknown capability '{name}'")]
    UnknownCapability { name: String },

    /// The gateway itself failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// A fully resolved request.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub capability: &'a Capability,
    pub argument: String,
}

/// Runs the protocol against a registry through a completion gateway.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<Registry>,
    gateway: Arc<dyn CompletionGateway>,
}

impl Resolver {
    pub fn new(registry: Arc<Registry>, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { registry, gateway }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Phase 1: choose the capability for `text`.
    pub async fn select(&self, text: &str) -> Result<&Capability, ResolutionError> {
        let messages = vec![
            ChatMessage::system(prompts::selection_prompt(&self.registry.render_basic())),
            ChatMessage::user(text),
        ];

        let name = self.ask(Phase::Select, messages).await?;
        log::debug!("Model selected '{}'", name);

        self.registry
            .lookup(&name)
            .ok_or(ResolutionError::UnknownCapability { name })
    }

    /// Phase 2: synthesize the argument for `capability` from `text`.
    pub async fn synthesize_argument(
        &self,
        capability: &Capability,
        text: &str,
    ) -> Result<String, ResolutionError> {
        let documentation = self.registry.render_full(capability);
        let messages = vec![
            ChatMessage::system(prompts::argument_prompt(
                capability.qualified_name(),
                &documentation,
            )),
            ChatMessage::user(text),
        ];

        let answer = self.ask(Phase::Argument, messages).await?;
        let argument = strip_matching_quotes(&answer);
        if argument.is_empty() {
            return Err(ResolutionError::MalformedAnswer {
                phase: Phase::Argument,
                response: answer,
            });
        }
        Ok(argument.to_string())
    }

    /// Run both phases.
    pub async fn resolve(&self, text: &str) -> Result<Resolution<'_>, ResolutionError> {
        let capability = self.select(text).await?;
        let argument = self.synthesize_argument(capability, text).await?;
        log::info!(
            "Resolved request to {} with argument {:?}",
            capability.qualified_name(),
            argument
        );
        Ok(Resolution {
            capability,
            argument,
        })
    }

    /// One gateway round-trip, returning the non-empty enveloped payload.
    async fn ask(&self, phase: Phase, messages: Vec<ChatMessage>) -> Result<String, ResolutionError> {
        log::debug!(
            "Resolution {} phase: model={}, messages={}",
            phase,
            self.gateway.model(),
            messages.len()
        );

        let completion = self.gateway.complete(messages).await?;
        let text = completion
            .first_text()
            .ok_or(ResolutionError::NoCompletion { phase })?;

        match extract_answer(text) {
            Some(payload) if !payload.is_empty() => Ok(payload),
            _ => Err(ResolutionError::MalformedAnswer {
                phase,
                response: text.to_string(),
            }),
        }
    }
}
