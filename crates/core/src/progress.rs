//! Progress events emitted while an agent works.
//!
//! The loop awaits each emission in order, so a slow sink slows the loop.
//! Wire names follow the UI protocol:
//! - `thinking`: a planning turn started
//! - `query_summary`: the model labelled the task (e.g. `[Task: Fibonacci]`)
//! - `code_execution`: code is about to run in the sandbox
//! - `observation`: sandbox output came back

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum ProgressEvent {
    Thinking(String),
    QuerySummary(String),
    CodeExecution(String),
    Observation(String),
}

impl ProgressEvent {
    /// Wire name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking(_) => "thinking",
            Self::QuerySummary(_) => "query_summary",
            Self::CodeExecution(_) => "code_execution",
            Self::Observation(_) => "observation",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Thinking(c)
            | Self::QuerySummary(c)
            | Self::CodeExecution(c)
            | Self::Observation(c) => c,
        }
    }
}

/// Receives progress events from a running invocation.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: ProgressEvent);
}

/// Forwards events into a tokio channel. A closed receiver is ignored.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event).await;
    }
}
