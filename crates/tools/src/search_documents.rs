//! Document search tool: lets an agent look up document metadata by name
//! or topic when its initial context did not show what it needs.

use async_trait::async_trait;
use quorum_core::error::ToolError;
use quorum_core::tool::Tool;
use quorum_retrieval::ContextRetriever;
use std::sync::Arc;

pub struct SearchDocumentsTool {
    retriever: Arc<ContextRetriever>,
}

impl SearchDocumentsTool {
    pub fn new(retriever: Arc<ContextRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn name(&self) -> &str {
        "search_documents"
    }

    fn description(&self) -> &str {
        "Explicitly search for uploaded documents by name or topic to see their metadata"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The file name or topic to search for"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let query = arguments["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let context = self.retriever.retrieve(query).await;

        Ok(serde_json::json!({
            "status": "success",
            "matches": context.rendered_text,
            "sources": context.sources_used,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::retrieval::DocumentRecord;
    use quorum_retrieval::InMemoryDocumentIndex;

    fn tool() -> SearchDocumentsTool {
        let index = InMemoryDocumentIndex::new(vec![DocumentRecord {
            title: "sample1.csv".into(),
            file_id: None,
            source: "uploads/sample1.csv".into(),
            content: Some("id,name,amount".into()),
            score: 0.0,
        }]);
        SearchDocumentsTool::new(Arc::new(ContextRetriever::new().with_documents(Arc::new(index))))
    }

    #[tokio::test]
    async fn returns_rendered_metadata() {
        let result = tool()
            .execute(serde_json::json!({"query": "sample1"}))
            .await
            .unwrap();
        assert_eq!(result["status"], "success");
        assert!(result["matches"].as_str().unwrap().contains("[Database] sample1.csv"));
        assert_eq!(result["sources"][0], "In-Memory Documents");
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let err = tool().execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
