//! Role agents for Quorum.
//!
//! Every agent is a [`RoleSpec`] (prompt, tool catalog, tool-forcing
//! policy) driven by the same tool-use loop in [`RoleAgent`]. The
//! [`Dispatcher`] resolves tool calls to local handlers, the code sandbox,
//! or a delegation to another registered agent.

pub mod dispatcher;
pub mod error;
pub mod loop_runner;
pub mod registry;
pub mod role;
pub mod roles;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use dispatcher::{Dispatch, Dispatcher, ToolBinding};
pub use error::AgentError;
pub use loop_runner::RoleAgent;
pub use registry::{build_from_config, build_registry, AgentDeps, BuildError};
pub use role::{RoleSpec, ToolForcing};
