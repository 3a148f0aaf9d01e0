//! The shared tool-use loop.
//!
//! Every role runs the same cycle: retrieve context, plan with the model,
//! dispatch tool calls, observe, re-plan. The loop ends with a final
//! answer, a delegate's response, or a failure response.

use crate::dispatcher::{Dispatch, Dispatcher};
use crate::error::AgentError;
use crate::role::RoleSpec;
use crate::roles::DATA_ACCESS_POLICY;
use async_trait::async_trait;
use chrono::Utc;
use quorum_core::agent::{Agent, AgentResponse, Invocation};
use quorum_core::event::{DomainEvent, EventBus};
use quorum_core::message::{Message, Transcript};
use quorum_core::progress::ProgressEvent;
use quorum_core::provider::{Provider, ProviderRequest};
use quorum_core::tool::{EXECUTE_CODE_TOOL, TERMINAL_TOOLS};
use quorum_retrieval::{ContextRetriever, RetrievedContext};
use regex_lite::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// Appended after an answer that spells out a tool call as text.
const ECHO_CORRECTION: &str = "You wrote a tool call as plain text. Do not name tools in your answer. \
Call the tool through the tool interface, or answer the user directly.";

static TASK_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[Task:\s*([^\]]+)\]").expect("failed to compile task marker regex")
});

/// Extract the label of a `[Task: ...]` marker, if present.
pub fn task_summary(text: &str) -> Option<String> {
    TASK_MARKER_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// An agent defined by a [`RoleSpec`] and driven by the shared loop.
pub struct RoleAgent {
    role: RoleSpec,
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    retriever: Arc<ContextRetriever>,
    dispatcher: Arc<Dispatcher>,
    event_bus: Arc<EventBus>,
    max_steps: u32,
    max_retries: u32,
}

/// Mutable state of one invocation.
struct RunState {
    transcript: Transcript,
    steps: u32,
    failures: u32,
    tool_calls: u32,
    tool_executed: bool,
    tokens_used: u32,
    attachment: Option<String>,
}

impl RoleAgent {
    pub fn new(
        role: RoleSpec,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        retriever: Arc<ContextRetriever>,
        dispatcher: Arc<Dispatcher>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            role,
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            retriever,
            dispatcher,
            event_bus,
            max_steps: 10,
            max_retries: 3,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the ceiling on planning/acting round trips.
    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.max_steps = max;
        self
    }

    /// Set how many failed gateway calls end the invocation.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn role(&self) -> &RoleSpec {
        &self.role
    }

    fn system_prompt(&self, context: &RetrievedContext, invocation: &Invocation<'_>) -> String {
        let mut prompt = format!(
            "{DATA_ACCESS_POLICY}\n{}\n\n{}",
            self.role.prompt_with_context(invocation),
            context.rendered_text
        );
        if let Some(history) = invocation.context_str("conversation_history") {
            prompt.push_str(&format!("\n\nConversation History:\n{history}"));
        }
        prompt
    }

    async fn run(
        &self,
        query: &str,
        invocation: Invocation<'_>,
    ) -> Result<AgentResponse, AgentError> {
        let agent = self.role.key.as_str();

        let context = self.retriever.retrieve(query).await;
        debug!(
            agent,
            documents = context.documents.len(),
            entities = context.graph_entities.len(),
            "Context retrieved"
        );

        let mut state = RunState {
            transcript: Transcript::new(),
            steps: 0,
            failures: 0,
            tool_calls: 0,
            tool_executed: false,
            tokens_used: 0,
            attachment: None,
        };
        state.transcript.push(Message::system(self.system_prompt(&context, &invocation)));
        state
            .transcript
            .push(Message::user(self.role.query_with_context(query, &invocation)));

        loop {
            if state.steps >= self.max_steps {
                warn!(agent, steps = state.steps, "Step budget exhausted");
                return Err(AgentError::StepBudgetExhausted { steps: state.steps });
            }

            invocation
                .emit(ProgressEvent::Thinking(format!(
                    "{} is thinking (step {})",
                    self.role.name,
                    state.steps + 1
                )))
                .await;

            let (tools, tool_choice) = self.role.turn_policy(query, state.tool_executed);
            let request = ProviderRequest {
                model: self.model.clone(),
                messages: state.transcript.messages().to_vec(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools,
                tool_choice,
            };

            let response = match self.provider.complete(request).await {
                Ok(r) => r,
                Err(e) => {
                    state.failures += 1;
                    warn!(agent, attempt = state.failures, error = %e, "Gateway call failed");
                    if state.failures >= self.max_retries {
                        return Err(AgentError::Gateway {
                            attempts: state.failures,
                            source: e,
                        });
                    }
                    continue;
                }
            };
            if let Some(usage) = &response.usage {
                state.tokens_used += usage.total_tokens;
            }

            let message = response.message;
            if let Some(summary) = task_summary(message.text()) {
                invocation.emit(ProgressEvent::QuerySummary(summary)).await;
            }

            if !message.has_tool_calls() {
                let text = message.text().to_string();
                if TERMINAL_TOOLS.iter().any(|t| text.contains(t)) {
                    debug!(agent, step = state.steps, "Answer echoes a tool call, re-planning");
                    state.transcript.push(Message::assistant(text));
                    state.transcript.push(Message::system(ECHO_CORRECTION));
                    state.steps += 1;
                    continue;
                }
                return Ok(self.finish(text, &context, &state));
            }

            let calls = message.tool_calls.clone();
            state.transcript.push(message);

            for call in &calls {
                state.tool_calls += 1;
                match self
                    .dispatcher
                    .dispatch(call, agent, &self.role.local_tools, invocation)
                    .await
                {
                    Dispatch::Delegated(response) => return Ok(response),
                    Dispatch::Outcome(outcome) => {
                        if call.function_name == EXECUTE_CODE_TOOL {
                            if let Some(plot) =
                                outcome.payload.get("plot").and_then(|p| p.as_str())
                            {
                                state.attachment = Some(plot.to_string());
                            }
                        }
                        state.transcript.push(Message::tool_result(
                            &call.id,
                            &call.function_name,
                            outcome.to_message_content(),
                        ));
                    }
                }
            }

            state.steps += 1;
            state.tool_executed = true;
        }
    }

    fn finish(
        &self,
        content: String,
        context: &RetrievedContext,
        state: &RunState,
    ) -> AgentResponse {
        let mut sources = context.sources_used.clone();
        sources.extend(context.top_titles(3));

        info!(
            agent = %self.role.key,
            steps = state.steps,
            tool_calls = state.tool_calls,
            "Response generated"
        );
        self.event_bus.publish(DomainEvent::ResponseGenerated {
            agent: self.role.key.clone(),
            model: self.model.clone(),
            steps: state.steps,
            tokens_used: state.tokens_used,
            timestamp: Utc::now(),
        });

        AgentResponse::success(&self.role.name, content)
            .with_sources(sources)
            .with_metadata("context_used", serde_json::json!(context.has_documents()))
            .with_metadata("sources_used", serde_json::json!(context.sources_used))
            .with_metadata("data_access", serde_json::json!("metadata only"))
            .with_metadata("steps", serde_json::json!(state.steps))
            .with_metadata("tool_calls", serde_json::json!(state.tool_calls))
            .with_attachment(state.attachment.clone())
    }
}

#[async_trait]
impl Agent for RoleAgent {
    fn key(&self) -> &str {
        &self.role.key
    }

    fn name(&self) -> &str {
        &self.role.name
    }

    fn description(&self) -> &str {
        &self.role.description
    }

    async fn execute(&self, query: &str, invocation: Invocation<'_>) -> AgentResponse {
        match self.run(query, invocation).await {
            Ok(response) => response,
            Err(e) => {
                warn!(agent = %self.role.key, error = %e, "Invocation failed");
                self.event_bus.publish(DomainEvent::InvocationFailed {
                    agent: self.role.key.clone(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                AgentResponse::failure(&self.role.name, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use quorum_core::agent::AgentRegistry;
    use quorum_core::provider::ToolChoice;
    use quorum_core::sandbox::ExecutionOutput;
    use quorum_core::tool::ToolRegistry;

    fn agent_with(
        role: RoleSpec,
        provider: Arc<dyn Provider>,
        dispatcher: Dispatcher,
    ) -> RoleAgent {
        let bus = Arc::new(EventBus::default());
        RoleAgent::new(
            role,
            provider,
            "mock-model",
            Arc::new(ContextRetriever::new()),
            Arc::new(dispatcher),
            bus,
        )
    }

    fn bare_dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(EventBus::default()))
    }

    fn plain_role() -> RoleSpec {
        RoleSpec::new("plain", "Plain Agent", "answers").with_prompt("You answer briefly.")
    }

    #[test]
    fn task_summary_extraction() {
        assert_eq!(task_summary("[Task: Fibonacci] routing now").as_deref(), Some("Fibonacci"));
        assert_eq!(task_summary("[Task:   Sales trend ]").as_deref(), Some("Sales trend"));
        assert!(task_summary("no marker here").is_none());
        assert!(task_summary("[Task: ]").is_none());
    }

    #[tokio::test]
    async fn direct_answer_succeeds_with_metadata() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("The answer is 55.")]));
        let agent = agent_with(plain_role(), provider.clone(), bare_dispatcher());
        let registry = AgentRegistry::new();

        let resp = agent.execute("sum 1..10", Invocation::new(&registry)).await;
        assert!(resp.success);
        assert_eq!(resp.content, "The answer is 55.");
        assert_eq!(resp.agent_name, "Plain Agent");
        assert_eq!(resp.metadata["data_access"], "metadata only");
        assert_eq!(resp.metadata["steps"], 0);
        assert_eq!(resp.metadata["tool_calls"], 0);
        assert_eq!(resp.metadata["context_used"], false);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn system_prompt_carries_policy_role_prompt_and_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("ok")]));
        let agent = agent_with(plain_role(), provider.clone(), bare_dispatcher());
        let registry = AgentRegistry::new();
        let mut ctx = serde_json::Map::new();
        ctx.insert("conversation_history".into(), serde_json::json!("user: hi\nassistant: hello"));

        agent.execute("hi again", Invocation::new(&registry).with_context(&ctx)).await;

        let request = &provider.requests()[0];
        let system = request.messages[0].text();
        assert!(system.starts_with("DATA ACCESS POLICY:"));
        assert!(system.contains("You answer briefly."));
        assert!(system.contains("=== DATA SOURCES & METADATA ==="));
        assert!(system.ends_with("Conversation History:\nuser: hi\nassistant: hello"));
        assert_eq!(request.messages[1].text(), "hi again");
        assert_eq!(request.tool_choice, ToolChoice::None);
    }

    #[tokio::test]
    async fn gateway_failures_end_after_max_retries() {
        let provider = Arc::new(FailingProvider::new());
        let agent = agent_with(plain_role(), provider.clone(), bare_dispatcher());
        let registry = AgentRegistry::new();

        let resp = agent.execute("anything", Invocation::new(&registry)).await;
        assert!(!resp.success);
        assert_eq!(provider.call_count(), 3);
        assert!(resp.error.as_deref().unwrap().contains("gateway unreachable"));
        assert!(resp.content.starts_with("I apologize, I encountered an issue: "));
    }

    #[tokio::test]
    async fn transient_gateway_failures_are_retried_without_using_steps() {
        let provider = Arc::new(FlakyProvider::new(2, "The answer is 55."));
        let agent = agent_with(plain_role(), provider.clone(), bare_dispatcher());
        let registry = AgentRegistry::new();

        let resp = agent.execute("sum 1..10", Invocation::new(&registry)).await;
        assert!(resp.success);
        assert_eq!(resp.content, "The answer is 55.");
        assert_eq!(resp.metadata["steps"], 0);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn retries_are_configurable() {
        let provider = Arc::new(FailingProvider::new());
        let agent = agent_with(plain_role(), provider.clone(), bare_dispatcher())
            .with_max_retries(5);
        let registry = AgentRegistry::new();

        agent.execute("anything", Invocation::new(&registry)).await;
        assert_eq!(provider.call_count(), 5);
    }

    #[tokio::test]
    async fn thinking_and_task_summary_are_streamed() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response(
            "[Task: Greeting] Hello!",
        )]));
        let agent = agent_with(plain_role(), provider, bare_dispatcher());
        let registry = AgentRegistry::new();
        let sink = RecordingSink::default();

        agent.execute("hello", Invocation::new(&registry).with_progress(&sink)).await;

        let events = sink.events();
        assert_eq!(events[0].event_type(), "thinking");
        assert_eq!(events[1], ProgressEvent::QuerySummary("Greeting".into()));
    }

    #[tokio::test]
    async fn local_tool_result_is_fed_back_and_tools_withheld() {
        let mut local = ToolRegistry::new();
        local.register(Box::new(EchoTool));
        let role = plain_role().with_local_tools(local);
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_response(vec![tool_call(
                "call_1",
                "echo",
                serde_json::json!({"text": "ping"}),
            )]),
            text_response("pong"),
        ]));
        let agent = agent_with(role, provider.clone(), bare_dispatcher());
        let registry = AgentRegistry::new();

        let resp = agent.execute("ping", Invocation::new(&registry)).await;
        assert!(resp.success);
        assert_eq!(resp.content, "pong");
        assert_eq!(resp.metadata["steps"], 1);
        assert_eq!(resp.metadata["tool_calls"], 1);

        let requests = provider.requests();
        assert_eq!(requests[0].tool_choice, ToolChoice::Auto);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[1].tool_choice, ToolChoice::None);
        assert!(requests[1].tools.is_empty());

        let messages = &requests[1].messages;
        let assistant = &messages[2];
        assert!(assistant.content.is_none());
        assert_eq!(assistant.tool_calls.len(), 1);
        let tool_msg = &messages[3];
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.text().contains(r#""status":"success""#));
    }

    #[tokio::test]
    async fn sandbox_plot_becomes_attachment() {
        let mut output = ExecutionOutput::success("");
        output.plot = Some("iVBORw0KGgo=".into());
        let dispatcher = bare_dispatcher().with_sandbox(Arc::new(FixedSandbox(output)));
        let role = plain_role().with_catalog(vec![quorum_tools::schemas::execute_code()]);
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_response(vec![tool_call(
                "call_1",
                "execute_code",
                serde_json::json!({"code": "plt.plot([1,2])"}),
            )]),
            text_response("Here is the chart."),
        ]));
        let agent = agent_with(role, provider, dispatcher);
        let registry = AgentRegistry::new();

        let resp = agent.execute("plot it", Invocation::new(&registry)).await;
        assert!(resp.success);
        assert_eq!(resp.attachment.as_deref(), Some("iVBORw0KGgo="));
    }

    #[tokio::test]
    async fn step_budget_is_configurable() {
        let looping: Vec<_> = (0..3)
            .map(|i| {
                tool_call_response(vec![tool_call(
                    &format!("call_{i}"),
                    "unknown_tool",
                    serde_json::json!({}),
                )])
            })
            .collect();
        let provider = Arc::new(ScriptedProvider::new(looping));
        let agent = agent_with(plain_role(), provider.clone(), bare_dispatcher())
            .with_max_steps(3);
        let registry = AgentRegistry::new();

        let resp = agent.execute("loop", Invocation::new(&registry)).await;
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Max steps or retries exceeded"));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failure_is_published_on_the_event_bus() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let agent = RoleAgent::new(
            plain_role(),
            Arc::new(FailingProvider::new()),
            "mock-model",
            Arc::new(ContextRetriever::new()),
            Arc::new(Dispatcher::new(bus.clone())),
            bus,
        );
        let registry = AgentRegistry::new();

        agent.execute("anything", Invocation::new(&registry)).await;

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.as_ref(),
            DomainEvent::InvocationFailed { agent, .. } if agent == "plain"
        ));
    }
}
