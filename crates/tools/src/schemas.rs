//! Catalog entries for tools that have no local handler: the delegation
//! directive, the sandbox tool, and the SQL helper tools.

use quorum_core::provider::ToolDefinition;
use quorum_core::tool::{EXECUTE_CODE_TOOL, ROUTE_TO_AGENT_TOOL};

/// `route_to_agent` restricted to the given agent keys.
pub fn route_to_agent<S: AsRef<str>>(agent_keys: &[S]) -> ToolDefinition {
    let keys: Vec<&str> = agent_keys.iter().map(|k| k.as_ref()).collect();
    ToolDefinition {
        name: ROUTE_TO_AGENT_TOOL.into(),
        description: "Route a query to a specialized agent".into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "agent_name": {
                    "type": "string",
                    "enum": keys,
                    "description": "The name of the specialized agent to handle the task"
                },
                "query": {
                    "type": "string",
                    "description": "The specific query or task to delegate"
                }
            },
            "required": ["agent_name", "query"]
        }),
    }
}

pub fn execute_code() -> ToolDefinition {
    ToolDefinition {
        name: EXECUTE_CODE_TOOL.into(),
        description: "Execute code in a sandbox. Returns stdout, stderr, and plots.".into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The valid Python code to execute."
                },
                "language": {
                    "type": "string",
                    "description": "The language (python or sql)",
                    "enum": ["python", "sql"]
                }
            },
            "required": ["code"]
        }),
    }
}

pub fn generate_sql() -> ToolDefinition {
    ToolDefinition {
        name: "generate_sql".into(),
        description: "Generate a SQL query from natural language".into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "question": { "type": "string", "description": "The question to answer with SQL" }
            },
            "required": ["question"]
        }),
    }
}

pub fn explain_sql() -> ToolDefinition {
    ToolDefinition {
        name: "explain_sql".into(),
        description: "Explain what a SQL query does".into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The SQL query to explain" }
            },
            "required": ["query"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_schema_lists_agent_keys() {
        let def = route_to_agent(&["sql", "python", "researcher"]);
        assert_eq!(def.name, "route_to_agent");
        let keys = def.parameters["properties"]["agent_name"]["enum"].as_array().unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[1], "python");
    }

    #[test]
    fn execute_code_requires_code() {
        let def = execute_code();
        assert_eq!(def.parameters["required"][0], "code");
    }
}
