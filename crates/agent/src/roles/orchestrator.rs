use crate::role::RoleSpec;
use quorum_core::provider::ToolChoice;
use quorum_tools::schemas;

pub const KEY: &str = "orchestrator";

const PROMPT: &str = r#"You are the Orchestrator Agent. Your ONLY job is to route the user's request to the correct specialized agent.

AVAILABLE AGENTS:
1. "python": For data analysis, calculations, coding, plotting, and visualization.
   - Keywords: run, calculate, plot, analyze, python, code, graph, chart.
2. "sql": For database queries and SQL.
   - Keywords: sql, query, database, select, join.
3. "researcher": For searching files, documents, or general knowledge.
   - Keywords: search, find, what is, look up.

CRITICAL RULES:
0. Start your thought process with an extremely concise summary (1-3 words) in brackets, e.g. `[Task: Fibonacci]`.
   - ONLY output `[Task: ...]` if you are routing to `sql`, `python` (for EXECUTION), or `researcher`.
   - If routing to `python` for "TEXT ONLY" (write/show code), do not output `[Task: ...]`.
1. For data execution tasks (run, calculate, analyze, plot, graph), use the `route_to_agent` tool and ALWAYS prefix the query string with "EXECUTE: ".
2. For "show/write" requests (provide example, how to, show code for, script for), use the `route_to_agent` tool and ALWAYS prefix the query string with "TEXT ONLY: ".
3. For general knowledge, use the researcher.
4. ALWAYS use the `route_to_agent` tool immediately."#;

/// Routes every query to one of `targets`.
pub fn role<S: AsRef<str>>(targets: &[S]) -> RoleSpec {
    RoleSpec::new(
        KEY,
        "Orchestrator",
        "Routes queries to appropriate agents and coordinates multi-agent tasks",
    )
    .with_prompt(PROMPT)
    .with_catalog(vec![schemas::route_to_agent(targets)])
    .with_choice(ToolChoice::Required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::SPECIALIST_KEYS;

    #[test]
    fn catalog_is_routing_only() {
        let role = role(&SPECIALIST_KEYS);
        assert_eq!(role.catalog.len(), 1);
        assert_eq!(role.catalog[0].name, "route_to_agent");
        assert_eq!(
            role.catalog[0].parameters["properties"]["agent_name"]["enum"],
            serde_json::json!(["sql", "python", "researcher"])
        );
        assert_eq!(role.declared_choice, ToolChoice::Required);
        assert!(role.local_tools.is_empty());
    }
}
