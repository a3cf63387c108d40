//! Dispatch loop: glues the ledger, resolver and transport together.
//!
//! Per inbound event:
//!
//! 1. Self-originated events are ignored and never recorded.
//! 2. Already-recorded events are dropped.
//! 3. The event id is recorded *before* any side effect.
//! 4. The resolver selects a capability and synthesizes its argument.
//! 5. The capability runs on the blocking pool.
//! 6. Its result is sent to the originating user.
//!
//! Failures after step 3 are logged and not retried: capability side effects
//! run at most once per event id, at the cost of dropping events whose
//! resolution fails.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::ledger::{EventLedger, LedgerError};
use crate::resolution::{ResolutionError, Resolver};
use crate::transport::{ChatTransport, InboundEvent, TransportError};

/// Reply sent to the user when [`ErrorReplyPolicy::Notify`] is active.
pub const ERROR_REPLY: &str = "Sorry, I couldn't handle that request.";

/// What to tell the user when dispatch fails after the event was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorReplyPolicy {
    /// Log only; the user gets no reply.
    #[default]
    Silent,
    /// Log and send [`ERROR_REPLY`].
    Notify,
}

/// Result of a dispatch that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The bot authored the event.
    IgnoredSelf,
    /// The event id was already recorded (redelivery or lost race).
    Duplicate,
    /// A capability ran and its result was sent.
    Replied { capability: String, argument: String },
}

/// Errors that abort a single event's dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The capability's own action failed.
    #[error("capability '{capability}' failed: {source}")]
    CapabilityFailed {
        capability: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A blocking worker panicked or was cancelled.
    #[error("dispatch worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// Handles inbound events end to end.
pub struct Dispatcher {
    resolver: Resolver,
    ledger: Arc<dyn EventLedger>,
    transport: Arc<dyn ChatTransport>,
    error_replies: ErrorReplyPolicy,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("capabilities", &self.resolver.registry().len())
            .field("error_replies", &self.error_replies)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        resolver: Resolver,
        ledger: Arc<dyn EventLedger>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            resolver,
            ledger,
            transport,
            error_replies: ErrorReplyPolicy::default(),
        }
    }

    pub fn with_error_replies(mut self, policy: ErrorReplyPolicy) -> Self {
        self.error_replies = policy;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn EventLedger> {
        &self.ledger
    }

    /// Handle one event.
    pub async fn dispatch(&self, event: InboundEvent) -> Result<DispatchOutcome, DispatchError> {
        if event.from_bot {
            log::debug!("Ignoring self-originated event {}", event.event_id);
            return Ok(DispatchOutcome::IgnoredSelf);
        }

        let admitted = match self.admit(&event.event_id).await {
            Ok(admitted) => admitted,
            Err(e) => {
                log::error!("Ledger check failed for event {}: {}", event.event_id, e);
                return Err(e);
            }
        };
        if !admitted {
            log::info!("Dropping already handled event {}", event.event_id);
            return Ok(DispatchOutcome::Duplicate);
        }

        match self.run_recorded(&event).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                log::error!("Failed to handle event {}: {}", event.event_id, e);
                if self.error_replies == ErrorReplyPolicy::Notify {
                    if let Err(reply_err) = self.transport.reply(&event.user_id, ERROR_REPLY).await {
                        log::warn!(
                            "Failed to send error reply for event {}: {}",
                            event.event_id,
                            reply_err
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Consume events until the channel closes, one task per event.
    ///
    /// Returns once the channel is closed and every in-flight event finished.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<InboundEvent>) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    let Some(event) = maybe_event else { break };
                    let dispatcher = Arc::clone(&self);
                    in_flight.spawn(async move {
                        let event_id = event.event_id.clone();
                        if let Err(e) = dispatcher.dispatch(event).await {
                            log::debug!("Event {} dropped after error: {}", event_id, e);
                        }
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        log::error!("Dispatch task panicked: {}", e);
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                log::error!("Dispatch task panicked: {}", e);
            }
        }
        log::info!("Dispatch loop stopped");
    }

    /// Check and record the event id. `false` means drop the event.
    async fn admit(&self, event_id: &str) -> Result<bool, DispatchError> {
        let ledger = Arc::clone(&self.ledger);
        let id = event_id.to_string();

        let admitted = tokio::task::spawn_blocking(move || -> Result<bool, LedgerError> {
            if ledger.exists(&id)? {
                return Ok(false);
            }
            match ledger.record(&id) {
                Ok(()) => Ok(true),
                Err(LedgerError::Duplicate { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await??;

        Ok(admitted)
    }

    async fn run_recorded(&self, event: &InboundEvent) -> Result<DispatchOutcome, DispatchError> {
        let resolution = self.resolver.resolve(&event.text).await?;
        let capability = resolution.capability.qualified_name().to_string();

        let handler = resolution.capability.handler();
        let argument = resolution.argument.clone();
        let result = tokio::task::spawn_blocking(move || handler.invoke(&argument))
            .await?
            .map_err(|source| DispatchError::CapabilityFailed {
                capability: capability.clone(),
                source,
            })?;

        self.transport.reply(&event.user_id, &result).await?;
        log::info!("Event {} answered by {}", event.event_id, capability);

        Ok(DispatchOutcome::Replied {
            capability,
            argument: resolution.argument,
        })
    }
}
