//! The built-in roles.

pub mod orchestrator;
pub mod python;
pub mod researcher;
pub mod sql;

/// Prepended to every role's system prompt.
pub const DATA_ACCESS_POLICY: &str = "DATA ACCESS POLICY:
- You ONLY have access to data retrieved from the knowledge base
- Data sources: Uploaded Documents (RAG) and Knowledge Graph (KAG)
- You CANNOT access local files, databases, or external APIs directly
- When referencing data, always indicate its source
- If asked about data not in your context, say you don't have access to it";

/// Keys of the specialist roles the orchestrator can route to.
pub const SPECIALIST_KEYS: [&str; 3] = [sql::KEY, python::KEY, researcher::KEY];
