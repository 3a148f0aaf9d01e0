//! Trend analysis tool: gathers metadata framed around a market topic.
//! The model does the actual synthesis.

use async_trait::async_trait;
use quorum_core::error::ToolError;
use quorum_core::tool::Tool;
use quorum_retrieval::ContextRetriever;
use std::sync::Arc;

pub struct AnalyzeTrendsTool {
    retriever: Arc<ContextRetriever>,
}

impl AnalyzeTrendsTool {
    pub fn new(retriever: Arc<ContextRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for AnalyzeTrendsTool {
    fn name(&self) -> &str {
        "analyze_trends"
    }

    fn description(&self) -> &str {
        "Analyze market trends based on metadata of available documents"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "The market topic to analyze"
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let topic = arguments["topic"]
            .as_str()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'topic' argument".into()))?;

        let context = self.retriever.retrieve(&format!("trends in {topic}")).await;

        Ok(serde_json::json!({
            "status": "success",
            "analysis_base": context.rendered_text,
            "message": format!(
                "I have gathered the following metadata related to {topic}. \
                 I will now formulate an analysis based on these file titles and schemas."
            ),
        }))
    }
}
