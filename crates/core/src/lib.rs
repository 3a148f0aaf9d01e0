//! # Quorum Core
//!
//! Domain types, traits, and error definitions for the Quorum multi-agent
//! assistant. This crate has **no framework dependencies**: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (model gateway, search index, sandbox, progress sink)
//! is a trait here. Implementations live in their respective crates, so
//! tests can swap in scripted stand-ins and the dependency graph points
//! inward on core.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod retrieval;
pub mod sandbox;
pub mod progress;
pub mod agent;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, RetrievalError, ToolError};
pub use message::{Message, Role, ToolCall, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice, ToolDefinition, Usage};
pub use tool::{Tool, ToolOutcome, ToolRegistry, ToolStatus};
pub use retrieval::{
    DocumentIndex, DocumentRecord, GraphEntity, GraphIndex, SessionCatalog, SessionFile,
};
pub use sandbox::{CodeExecutor, ExecutionOutput};
pub use progress::{ChannelSink, ProgressEvent, ProgressSink};
pub use agent::{Agent, AgentRegistry, AgentResponse, Invocation};
pub use event::{DomainEvent, EventBus};
