//! Agent contract, invocation context and the agent registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use crate::progress::{ProgressEvent, ProgressSink};

/// Prefix of the user-facing content of every failed response.
pub const FAILURE_PREFIX: &str = "I apologize, I encountered an issue: ";

/// The terminal value of one agent invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,
    pub agent_name: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Encoded artifact (e.g. a base64 plot from the sandbox)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl AgentResponse {
    pub fn success(agent_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            agent_name: agent_name.into(),
            sources: Vec::new(),
            metadata: serde_json::Map::new(),
            success: true,
            error: None,
            attachment: None,
        }
    }

    /// A failed response; the caller still gets well-formed content.
    pub fn failure(agent_name: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            content: format!("{FAILURE_PREFIX}{error}"),
            agent_name: agent_name.into(),
            sources: Vec::new(),
            metadata: serde_json::Map::new(),
            success: false,
            error: Some(error),
            attachment: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_attachment(mut self, attachment: Option<String>) -> Self {
        self.attachment = attachment;
        self
    }
}

/// Per-call inputs shared with every agent reached from one request.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    /// Caller-supplied context (conversation history, schema, ...)
    pub context: Option<&'a serde_json::Map<String, serde_json::Value>>,
    /// Where progress events go
    pub progress: Option<&'a dyn ProgressSink>,
    /// Registry used to resolve delegation targets
    pub registry: &'a AgentRegistry,
}

impl<'a> Invocation<'a> {
    pub fn new(registry: &'a AgentRegistry) -> Self {
        Self {
            context: None,
            progress: None,
            registry,
        }
    }

    pub fn with_context(mut self, context: &'a serde_json::Map<String, serde_json::Value>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The invocation handed to a delegate: same sink and registry, no
    /// caller context.
    pub fn delegated(&self) -> Self {
        Self {
            context: None,
            progress: self.progress,
            registry: self.registry,
        }
    }

    /// Look up a string value in the caller context.
    pub fn context_str(&self, key: &str) -> Option<&'a str> {
        self.context
            .and_then(|c| c.get(key))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub async fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = self.progress {
            sink.emit(event).await;
        }
    }
}

/// Something that answers a query. Implementations must always return a
/// response; failures are reported through `success = false`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Registry key (e.g. "python").
    fn key(&self) -> &str;

    /// Display name (e.g. "Python Agent").
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn execute(&self, query: &str, invocation: Invocation<'_>) -> AgentResponse;
}

/// Maps agent keys to agents. Built once at start-up, read-only afterwards.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
    order: Vec<String>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its key. Replaces any previous entry.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        let key = agent.key().to_string();
        if !self.order.contains(&key) {
            self.order.push(key.clone());
        }
        self.agents.insert(key, agent);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn agents(&self) -> impl Iterator<Item = &Arc<dyn Agent>> {
        self.order.iter().filter_map(|k| self.agents.get(k))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAgent(&'static str);

    #[async_trait]
    impl Agent for FixedAgent {
        fn key(&self) -> &str {
            self.0
        }
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "fixed"
        }
        async fn execute(&self, query: &str, _invocation: Invocation<'_>) -> AgentResponse {
            AgentResponse::success(self.0, query)
        }
    }

    #[test]
    fn failure_response_is_well_formed() {
        let resp = AgentResponse::failure("SQL Agent", "gateway down");
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("gateway down"));
        assert_eq!(resp.content, "I apologize, I encountered an issue: gateway down");
    }

    #[test]
    fn registry_keeps_registration_order() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(FixedAgent("sql")));
        registry.register(Arc::new(FixedAgent("python")));
        registry.register(Arc::new(FixedAgent("sql")));
        assert_eq!(registry.keys(), ["sql".to_string(), "python".to_string()]);
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("researcher").is_none());
    }

    #[tokio::test]
    async fn registry_lookup_executes() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(FixedAgent("python")));
        let agent = registry.lookup("python").unwrap();
        let resp = agent.execute("sum 1..10", Invocation::new(&registry)).await;
        assert!(resp.success);
        assert_eq!(resp.content, "sum 1..10");
    }

    #[test]
    fn delegated_invocation_drops_context() {
        let registry = AgentRegistry::new();
        let mut ctx = serde_json::Map::new();
        ctx.insert("schema".into(), serde_json::json!("orders(id)"));
        let inv = Invocation::new(&registry).with_context(&ctx);
        assert_eq!(inv.context_str("schema"), Some("orders(id)"));
        assert!(inv.delegated().context.is_none());
    }
}
