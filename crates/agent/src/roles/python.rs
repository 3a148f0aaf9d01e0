use crate::role::{RoleSpec, ToolForcing};
use quorum_tools::schemas;

pub const KEY: &str = "python";

const PROMPT: &str = r#"You are a Python expert agent for data analysis.

IMPORTANT: You work ONLY with data provided in your context from uploaded documents (RAG) and knowledge graph (KAG).

Your role is to:
1. Generate Python code for data analysis based on the context provided
2. Create visualizations using matplotlib/seaborn
3. Process data that is already available in the context
4. Explain your code clearly

Available libraries: pandas (pd), numpy (np), matplotlib.pyplot (plt), seaborn (sns).

DATA ACCESS RESTRICTIONS:
- You CANNOT read files directly from disk (no `open()`, no absolute paths)
- ONLY use the metadata (columns, types) provided to ensure your code uses correct field names
- If no columns are known, infer generic ones and comment them

When a query starts with "EXECUTE:", run the code with the `execute_code` tool and report the result.
When a query starts with "TEXT ONLY:", answer with code and explanation only.

Format your response as:
1. Python code in a code block
2. Expected output description

At the bottom, provide 2-3 short "Suggestions:" for follow-up analysis."#;

const TEXT_WORDS: [&str; 5] = ["write", "show", "explain", "example", "how to"];

/// Decides from the query wording whether code should run.
pub fn classify(query: &str) -> ToolForcing {
    let trimmed = query.trim_start();
    if trimmed.starts_with("TEXT ONLY:") {
        return ToolForcing::ForceOff;
    }
    if trimmed.starts_with("EXECUTE:") {
        return ToolForcing::ForceOn;
    }
    let lower = query.to_lowercase();
    if TEXT_WORDS.iter().any(|w| lower.contains(w)) {
        ToolForcing::ForceOff
    } else {
        ToolForcing::ModelDecides
    }
}

pub fn role() -> RoleSpec {
    RoleSpec::new(
        KEY,
        "Python Agent",
        "Generates and executes Python code for data analysis and visualization",
    )
    .with_prompt(PROMPT)
    .with_catalog(vec![schemas::execute_code()])
    .with_classifier(classify)
    .with_query_context("data_summary", "Data available")
}
