//! Process sandbox: runs python snippets through a local interpreter.
//!
//! Each run is a fresh process with a timeout; nothing persists between
//! runs. SQL is not supported here.

use async_trait::async_trait;
use quorum_config::SandboxConfig;
use quorum_core::error::ToolError;
use quorum_core::sandbox::{CodeExecutor, ExecutionOutput};
use quorum_core::tool::EXECUTE_CODE_TOOL;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct ProcessSandbox {
    interpreter: String,
    timeout: Duration,
}

impl ProcessSandbox {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(&config.interpreter, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl CodeExecutor for ProcessSandbox {
    fn name(&self) -> &str {
        "process"
    }

    async fn run(&self, code: &str, language: &str) -> Result<ExecutionOutput, ToolError> {
        if !language.eq_ignore_ascii_case("python") {
            return Err(ToolError::ExecutionFailed {
                tool_name: EXECUTE_CODE_TOOL.into(),
                reason: format!("Language '{language}' is not supported by the process sandbox"),
            });
        }

        debug!(interpreter = %self.interpreter, bytes = code.len(), "Running snippet");

        let child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(code)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::SandboxUnavailable(format!(
                    "cannot start '{}': {e}",
                    self.interpreter
                )));
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Snippet timed out");
                return Err(ToolError::Timeout {
                    tool_name: EXECUTE_CODE_TOOL.into(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() {
            let mut result = ExecutionOutput::success(stdout);
            if !stderr.is_empty() {
                result.error = Some(stderr);
            }
            Ok(result)
        } else {
            let code = output.status.code().unwrap_or(-1);
            let error = if stderr.is_empty() {
                format!("exit code {code}")
            } else {
                stderr
            };
            Ok(ExecutionOutput::failure(stdout, error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sql_is_rejected() {
        let sandbox = ProcessSandbox::new("python3", Duration::from_secs(5));
        let err = sandbox.run("SELECT 1", "sql").await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn missing_interpreter_is_unavailable() {
        let sandbox = ProcessSandbox::new("definitely-not-an-interpreter", Duration::from_secs(5));
        let err = sandbox.run("print(1)", "python").await.unwrap_err();
        assert!(matches!(err, ToolError::SandboxUnavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_through_interpreter() {
        // `sh -c` stands in for an interpreter that accepts `-c <code>`
        let sandbox = ProcessSandbox::new("sh", Duration::from_secs(5));
        let out = sandbox.run("echo 55", "python").await.unwrap();
        assert!(out.is_success());
        assert_eq!(out.output, "55");

        let failed = sandbox.run("echo boom >&2; exit 3", "python").await.unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_snippet_times_out() {
        let sandbox = ProcessSandbox::new("sh", Duration::from_millis(200));
        let err = sandbox.run("sleep 5", "python").await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }
}
