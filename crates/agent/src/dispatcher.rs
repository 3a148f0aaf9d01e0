//! Tool dispatch: resolves one tool call to a local handler, the sandbox,
//! a delegation, or an "unimplemented" error outcome.
//!
//! Every failure becomes a [`ToolOutcome`] the model can read. Nothing
//! here returns an `Err`.

use chrono::Utc;
use quorum_core::agent::{AgentResponse, Invocation};
use quorum_core::event::{DomainEvent, EventBus};
use quorum_core::message::ToolCall;
use quorum_core::progress::ProgressEvent;
use quorum_core::sandbox::CodeExecutor;
use quorum_core::tool::{Tool, ToolOutcome, ToolRegistry, EXECUTE_CODE_TOOL, ROUTE_TO_AGENT_TOOL};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a tool name resolves to.
pub enum ToolBinding<'a> {
    Local(&'a dyn Tool),
    Sandbox,
    Delegation,
    Unimplemented,
}

/// Result of dispatching one call.
#[derive(Debug)]
pub enum Dispatch {
    /// Fed back to the model as a tool message
    Outcome(ToolOutcome),
    /// The delegate's response, returned to the caller unchanged
    Delegated(AgentResponse),
}

#[derive(Debug, Deserialize)]
struct SandboxArgs {
    code: String,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "python".into()
}

#[derive(Debug, Deserialize)]
struct RouteArgs {
    agent_name: String,
    query: String,
}

pub struct Dispatcher {
    sandbox: Option<Arc<dyn CodeExecutor>>,
    event_bus: Arc<EventBus>,
}

impl Dispatcher {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            sandbox: None,
            event_bus,
        }
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn CodeExecutor>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Local handlers win over the built-in bindings.
    pub fn resolve<'a>(&self, name: &str, local: &'a ToolRegistry) -> ToolBinding<'a> {
        if let Some(tool) = local.get(name) {
            return ToolBinding::Local(tool);
        }
        match name {
            EXECUTE_CODE_TOOL => ToolBinding::Sandbox,
            ROUTE_TO_AGENT_TOOL => ToolBinding::Delegation,
            _ => ToolBinding::Unimplemented,
        }
    }

    pub async fn dispatch(
        &self,
        call: &ToolCall,
        caller: &str,
        local: &ToolRegistry,
        invocation: Invocation<'_>,
    ) -> Dispatch {
        let started = Instant::now();
        debug!(tool = %call.function_name, agent = caller, "Dispatching tool call");

        let result = match parse_arguments(&call.arguments) {
            Err(outcome) => Dispatch::Outcome(outcome),
            Ok(args) => match self.resolve(&call.function_name, local) {
                ToolBinding::Local(tool) => Dispatch::Outcome(match tool.execute(args).await {
                    Ok(payload) => ToolOutcome::success(payload),
                    Err(e) => {
                        warn!(tool = %call.function_name, error = %e, "Tool failed");
                        ToolOutcome::error(e.to_string())
                    }
                }),
                ToolBinding::Sandbox => Dispatch::Outcome(self.run_sandbox(args, invocation).await),
                ToolBinding::Delegation => self.delegate(args, caller, invocation).await,
                ToolBinding::Unimplemented => Dispatch::Outcome(ToolOutcome::error(format!(
                    "Tool '{}' is not implemented",
                    call.function_name
                ))),
            },
        };

        let success = match &result {
            Dispatch::Outcome(outcome) => outcome.is_success(),
            Dispatch::Delegated(response) => response.success,
        };
        self.event_bus.publish(DomainEvent::ToolExecuted {
            agent: caller.to_string(),
            tool_name: call.function_name.clone(),
            success,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        result
    }

    async fn run_sandbox(
        &self,
        args: serde_json::Value,
        invocation: Invocation<'_>,
    ) -> ToolOutcome {
        let args: SandboxArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return ToolOutcome::error(format!("Invalid tool arguments: {e}")),
        };
        let Some(sandbox) = &self.sandbox else {
            return ToolOutcome::error("Code execution sandbox is not available");
        };

        invocation.emit(ProgressEvent::CodeExecution(args.code.clone())).await;

        match sandbox.run(&args.code, &args.language).await {
            Ok(out) => {
                let observation = if out.is_success() {
                    out.output.clone()
                } else {
                    out.error.clone().unwrap_or_else(|| out.output.clone())
                };
                invocation.emit(ProgressEvent::Observation(observation)).await;

                let payload = serde_json::to_value(&out).unwrap_or(serde_json::Value::Null);
                if out.is_success() {
                    ToolOutcome::success(payload)
                } else {
                    let detail = out.error.clone().unwrap_or_else(|| "Execution failed".into());
                    ToolOutcome::error_with_payload(detail, payload)
                }
            }
            Err(e) => {
                invocation.emit(ProgressEvent::Observation(e.to_string())).await;
                ToolOutcome::error(e.to_string())
            }
        }
    }

    async fn delegate(
        &self,
        args: serde_json::Value,
        caller: &str,
        invocation: Invocation<'_>,
    ) -> Dispatch {
        let args: RouteArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => {
                return Dispatch::Outcome(ToolOutcome::error(format!(
                    "Invalid tool arguments: {e}"
                )));
            }
        };
        let Some(agent) = invocation.registry.lookup(&args.agent_name) else {
            return Dispatch::Outcome(ToolOutcome::error(format!(
                "Agent '{}' not found",
                args.agent_name
            )));
        };

        info!(from = caller, to = %args.agent_name, "Delegating query");
        self.event_bus.publish(DomainEvent::Delegated {
            from: caller.to_string(),
            to: args.agent_name.clone(),
            timestamp: Utc::now(),
        });

        Dispatch::Delegated(agent.execute(&args.query, invocation.delegated()).await)
    }
}

/// Empty arguments mean `{}`; anything that is not a JSON object is an
/// error outcome.
fn parse_arguments(raw: &str) -> Result<serde_json::Value, ToolOutcome> {
    if raw.trim().is_empty() {
        return Ok(serde_json::json!({}));
    }
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v @ serde_json::Value::Object(_)) => Ok(v),
        Ok(_) => Err(ToolOutcome::error("Invalid tool arguments: expected a JSON object")),
        Err(e) => Err(ToolOutcome::error(format!("Invalid tool arguments: {e}"))),
    }
}
