//! Errors that end an invocation. They never escape
//! [`quorum_core::Agent::execute`]; the loop turns them into a failure
//! response.

use quorum_core::error::ProviderError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The gateway kept failing; carries the last error
    #[error("{source}")]
    Gateway { attempts: u32, source: ProviderError },

    #[error("Max steps or retries exceeded")]
    StepBudgetExhausted { steps: u32 },
}
