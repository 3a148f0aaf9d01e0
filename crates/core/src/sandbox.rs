//! Code execution sandbox: an opaque collaborator that runs a snippet and
//! reports what happened.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;

/// What a sandbox run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// "success" or "error"
    pub status: String,

    #[serde(default)]
    pub output: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Base64-encoded image produced by the snippet, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
}

impl ExecutionOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            output: output.into(),
            error: None,
            plot: None,
        }
    }

    pub fn failure(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            output: output.into(),
            error: Some(error.into()),
            plot: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Runs code on behalf of any agent.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, code: &str, language: &str) -> Result<ExecutionOutput, ToolError>;
}
