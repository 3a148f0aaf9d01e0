//! Tool trait: the abstraction over agent-local capabilities.
//!
//! Local tools are bound per role in a [`ToolRegistry`]. The two
//! cross-agent tools (sandboxed code execution and delegation) are not
//! registered here; the dispatcher resolves them by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Name of the well-known sandboxed code execution tool.
pub const EXECUTE_CODE_TOOL: &str = "execute_code";

/// Name of the delegation directive.
pub const ROUTE_TO_AGENT_TOOL: &str = "route_to_agent";

/// Tool names that end a turn when issued. A final answer that merely
/// mentions one of them is treated as an echoed call.
pub const TERMINAL_TOOLS: [&str; 2] = [ROUTE_TO_AGENT_TOOL, EXECUTE_CODE_TOOL];

/// Whether a tool ran successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// The normalized result of any tool call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub status: ToolStatus,

    /// JSON payload produced by the tool (`null` on most errors)
    #[serde(default)]
    pub payload: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ToolOutcome {
    pub fn success(payload: serde_json::Value) -> Self {
        Self {
            status: ToolStatus::Success,
            payload,
            error_detail: None,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            payload: serde_json::Value::Null,
            error_detail: Some(detail.into()),
        }
    }

    /// An error outcome that still carries a payload (e.g. sandbox stderr).
    pub fn error_with_payload(detail: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            status: ToolStatus::Error,
            payload,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Serialize for a tool-role transcript message.
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","payload":null,"error_detail":"{e}"}}"#)
        })
    }
}

/// The core Tool trait for role-local handlers.
///
/// Synchronous handlers simply return without awaiting; the dispatcher
/// treats both kinds the same way.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "search_documents").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with already-parsed arguments (a JSON object).
    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A table of local tool handlers, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name and
    /// keeps its original position.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if !self.order.contains(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.to_definition())
            .collect()
    }

    /// Registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
