//! Scripted gateway double for unit tests.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;

use super::base_llm::{ChatMessage, Completion, CompletionGateway, GatewayError};

type Responder = fn(&[ChatMessage]) -> Completion;

/// Replays queued completions in order and records every request.
///
/// Once the script is exhausted, calls go to the responder if one is set,
/// otherwise they return an empty completion.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    script: Mutex<VecDeque<Result<Completion, GatewayError>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer every call by inspecting the request, for concurrent tests
    /// where call order is not deterministic.
    pub(crate) fn responding(responder: Responder) -> Self {
        Self {
            responder: Some(responder),
            ..Self::default()
        }
    }

    /// Queue a single-choice answer.
    pub(crate) fn then_answer(self, content: &str) -> Self {
        self.then(Ok(Completion::single(content)))
    }

    pub(crate) fn then(self, result: Result<Completion, GatewayError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl fmt::Debug for ScriptedGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedGateway")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Completion, GatewayError> {
        let scripted = self.script.lock().unwrap().pop_front();
        let result = match (scripted, self.responder) {
            (Some(result), _) => result,
            (None, Some(responder)) => Ok(responder(&messages)),
            (None, None) => Ok(Completion::default()),
        };
        self.requests.lock().unwrap().push(messages);
        result
    }
}
