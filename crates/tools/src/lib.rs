//! Tool implementations for Quorum agents.
//!
//! Local tools (document search, trend analysis) are backed by the shared
//! context retriever. The delegation and sandbox tools have no local
//! handler; [`schemas`] only describes them to the model, and
//! [`ProcessSandbox`] is one [`quorum_core::CodeExecutor`] the dispatcher
//! can use for `execute_code`.

pub mod analyze_trends;
pub mod sandbox;
pub mod schemas;
pub mod search_documents;

pub use analyze_trends::AnalyzeTrendsTool;
pub use sandbox::ProcessSandbox;
pub use search_documents::SearchDocumentsTool;

use quorum_core::tool::ToolRegistry;
use quorum_retrieval::ContextRetriever;
use std::sync::Arc;

/// Local tools of the research role.
pub fn research_registry(retriever: Arc<ContextRetriever>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SearchDocumentsTool::new(retriever.clone())));
    registry.register(Box::new(AnalyzeTrendsTool::new(retriever)));
    registry
}
