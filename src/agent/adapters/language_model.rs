//! In-process language models.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::agent::ports::{LanguageModel, LlmError, LlmRequest, LlmResponse};

/// Answers every prompt by quoting its last line.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoLanguageModel;

#[async_trait]
impl LanguageModel for EchoLanguageModel {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let last_line = request
            .prompt
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or(LlmError::Empty)?;
        Ok(LlmResponse::from_text(format!("echo: {last_line}")))
    }
}

/// Replays queued outcomes and records every request.
///
/// Once the queue is empty every call fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLanguageModel {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug, Default)]
struct ScriptState {
    outcomes: VecDeque<Result<LlmResponse, LlmError>>,
    requests: Vec<LlmRequest>,
}

impl ScriptedLanguageModel {
    /// Creates a model with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful completion.
    pub fn then_reply(&self, text: &str) -> &Self {
        self.push(Ok(LlmResponse::from_text(text)));
        self
    }

    /// Queues `times` failed attempts.
    pub fn then_fail(&self, times: usize) -> &Self {
        for _ in 0..times {
            self.push(Err(LlmError::Request("scripted failure".to_owned())));
        }
        self
    }

    fn push(&self, outcome: Result<LlmResponse, LlmError>) {
        if let Ok(mut state) = self.state.lock() {
            state.outcomes.push_back(outcome);
        }
    }

    /// Returns every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.state
            .lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| LlmError::Request(err.to_string()))?;
        state.requests.push(request.clone());
        state
            .outcomes
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Request("script exhausted".to_owned())))
    }
}
