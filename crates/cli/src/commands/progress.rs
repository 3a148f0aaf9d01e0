//! Terminal rendering of progress events and domain events.

use async_trait::async_trait;
use quorum_core::event::{DomainEvent, EventBus};
use quorum_core::progress::{ProgressEvent, ProgressSink};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

/// Writes progress events to stderr so stdout carries only the answer.
pub struct StderrProgress;

/// One display line per event; code blocks are indented.
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Thinking(msg) => format!("  … {msg}"),
        ProgressEvent::QuerySummary(label) => format!("  ▸ Task: {label}"),
        ProgressEvent::CodeExecution(code) => {
            let body: Vec<String> = code.lines().map(|l| format!("      {l}")).collect();
            format!("  ⚙ Running code:\n{}", body.join("\n"))
        }
        ProgressEvent::Observation(out) => format!("  ◂ {}", out.trim_end()),
    }
}

#[async_trait]
impl ProgressSink for StderrProgress {
    async fn emit(&self, event: ProgressEvent) {
        eprintln!("{}", format_event(&event));
    }
}

/// Log every domain event at debug level until the bus is dropped.
pub fn spawn_event_logger(bus: &Arc<EventBus>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match event.as_ref() {
                    DomainEvent::ResponseGenerated { agent, steps, tokens_used, .. } => {
                        debug!(agent, steps, tokens_used, "Response generated")
                    }
                    DomainEvent::ToolExecuted { agent, tool_name, success, duration_ms, .. } => {
                        debug!(agent, tool = tool_name, success, duration_ms, "Tool executed")
                    }
                    DomainEvent::Delegated { from, to, .. } => debug!(from, to, "Delegated"),
                    DomainEvent::InvocationFailed { agent, error_message, .. } => {
                        debug!(agent, error = error_message, "Invocation failed")
                    }
                },
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}
