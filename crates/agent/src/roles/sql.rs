use crate::role::RoleSpec;
use quorum_tools::schemas;

pub const KEY: &str = "sql";

const PROMPT: &str = r#"You are a helpful and harmless SQL Expert Assistant.

Your functionality is restricted to:
1. Helping users understand the database structure (schema).
2. Generating SQL queries based on the provided schema.

SAFE SCHEMA ACCESS:
- It is safe and permitted to list table names and column names from the metadata provided to you.
- You do NOT have access to the actual data content, only the schema (structure).
- If a user asks "what tables are in the database", list the table names you see in the schema.

Guidelines:
- Treat file names in your context as table names (e.g. "sales.csv" -> "sales" table).
- Use columns from the provided schema.
- Generate standard ANSI SQL unless specified otherwise.
- If you don't know the exact column names, say so and suggest plausible names based on the table purpose.
- Do NOT try to execute queries. You are a text-based query generator."#;

/// Writes and explains SQL. Its tools have no handlers, so calls to them
/// come back as "not implemented" outcomes.
pub fn role() -> RoleSpec {
    RoleSpec::new(
        KEY,
        "SQL Agent",
        "Generates SQL queries from natural language using retrieved schema information",
    )
    .with_prompt(PROMPT)
    .with_catalog(vec![schemas::generate_sql(), schemas::explain_sql()])
    .with_prompt_context("schema", "Database Schema")
}
