//! Retrieval traits: the document index, graph index and session catalog
//! the context retriever reads from.
//!
//! Index records may carry body text because real search backends return
//! it. Consumers of these traits must never surface it: only titles,
//! identifiers and source labels leave the retrieval layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::RetrievalError;

/// A single hit from a document index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub title: String,

    /// Identifier of the uploaded file this chunk belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    /// Source label (file name, blob path, ...)
    #[serde(default)]
    pub source: String,

    /// Body text as stored in the index. Never rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default)]
    pub score: f32,
}

/// A node from the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEntity {
    pub name: String,
    #[serde(default = "default_label")]
    pub label: String,
}

fn default_label() -> String {
    "Entity".into()
}

/// A file uploaded in the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    pub id: String,
    pub filename: String,
    /// pending, processing, indexed, failed
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "indexed".into()
}

/// A ranked document search backend.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Provenance label attached to results (e.g. "Azure AI Search").
    fn label(&self) -> &str;

    /// Return at most `limit` records, best first.
    async fn search(&self, query: &str, limit: usize)
    -> Result<Vec<DocumentRecord>, RetrievalError>;
}

/// A knowledge-graph entity lookup backend.
#[async_trait]
pub trait GraphIndex: Send + Sync {
    fn label(&self) -> &str;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<GraphEntity>, RetrievalError>;
}

/// The set of files known to be active in the current session.
#[async_trait]
pub trait SessionCatalog: Send + Sync {
    async fn list_files(&self) -> Vec<SessionFile>;
}
