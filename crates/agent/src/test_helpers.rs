//! Shared test doubles for the agent crate.

use async_trait::async_trait;
use quorum_core::agent::{Agent, AgentResponse, Invocation};
use quorum_core::error::{ProviderError, ToolError};
use quorum_core::message::{Message, ToolCall};
use quorum_core::progress::{ProgressEvent, ProgressSink};
use quorum_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use quorum_core::sandbox::{CodeExecutor, ExecutionOutput};
use quorum_core::tool::Tool;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses and
/// records every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let n = requests.len();
        assert!(
            n < responses.len(),
            "ScriptedProvider: no more responses (call #{n}, have {})",
            responses.len()
        );
        requests.push(request);
        Ok(responses[n].clone())
    }
}

/// A provider whose every call fails.
pub struct FailingProvider {
    calls: Mutex<usize>,
}

impl FailingProvider {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        Err(ProviderError::Network("gateway unreachable".into()))
    }
}

/// Fails a fixed number of times, then answers with the given text.
pub struct FlakyProvider {
    failures_left: Mutex<usize>,
    calls: Mutex<usize>,
    answer: String,
}

impl FlakyProvider {
    pub fn new(failures: usize, answer: &str) -> Self {
        Self {
            failures_left: Mutex::new(failures),
            calls: Mutex::new(0),
            answer: answer.into(),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(ProviderError::Timeout("gateway slow".into()));
        }
        Ok(text_response(&self.answer))
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn tool_call_response(calls: Vec<ToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_tool_calls(calls),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(id, name, args.to_string())
}

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes back the input"
    }
    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Ok(arguments["text"].clone())
    }
}

/// A sandbox that returns the same output for every run.
pub struct FixedSandbox(pub ExecutionOutput);

#[async_trait]
impl CodeExecutor for FixedSandbox {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn run(&self, _code: &str, _language: &str) -> Result<ExecutionOutput, ToolError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// An agent that answers every query with a fixed response.
pub struct StubAgent {
    key: String,
    response: AgentResponse,
    queries: Mutex<Vec<String>>,
}

impl StubAgent {
    pub fn new(key: &str, response: AgentResponse) -> Self {
        Self {
            key: key.into(),
            response,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for StubAgent {
    fn key(&self) -> &str {
        &self.key
    }
    fn name(&self) -> &str {
        &self.response.agent_name
    }
    fn description(&self) -> &str {
        "stub"
    }
    async fn execute(&self, query: &str, _invocation: Invocation<'_>) -> AgentResponse {
        self.queries.lock().unwrap().push(query.to_string());
        self.response.clone()
    }
}
