//! Context retrieval for Quorum agents.
//!
//! The [`ContextRetriever`] fans a query out to a document index and a
//! graph index, keeps only metadata, and renders a provenance-tagged
//! context block for the system prompt.

pub mod in_memory;
pub mod intent;
pub mod retriever;
pub mod search_service;

pub use in_memory::{InMemoryDocumentIndex, InMemoryGraphIndex, InMemorySessionCatalog, SeedData};
pub use retriever::{ContextRetriever, DocumentMeta, DocumentScope, RetrievedContext};
pub use search_service::SearchServiceIndex;

use quorum_config::RetrievalConfig;
use quorum_core::error::RetrievalError;
use std::path::Path;
use std::sync::Arc;

/// Build a retriever from configuration.
///
/// A configured search service becomes the document index; otherwise the
/// seed file (if any) backs in-memory indexes. Session files listed in the
/// config are merged with those in the seed file.
pub fn build_from_config(config: &RetrievalConfig) -> Result<ContextRetriever, RetrievalError> {
    let seed = match &config.seed_file {
        Some(path) => SeedData::load(Path::new(path))?,
        None => SeedData::default(),
    };

    let mut session_files = seed.session_files.clone();
    session_files.extend(config.session_files.iter().cloned());

    let mut retriever = ContextRetriever::new()
        .with_limits(config.document_limit, config.graph_limit)
        .with_session(Arc::new(InMemorySessionCatalog::new(session_files)));

    if let (Some(endpoint), Some(index), Some(key)) = (
        &config.search_endpoint,
        &config.search_index,
        &config.search_api_key,
    ) {
        tracing::info!(%endpoint, %index, "Using search service document index");
        retriever =
            retriever.with_documents(Arc::new(SearchServiceIndex::new(endpoint, index, key)));
    } else if !seed.documents.is_empty() {
        retriever = retriever.with_documents(Arc::new(InMemoryDocumentIndex::new(
            seed.documents.clone(),
        )));
    }

    if !seed.graph.is_empty() {
        retriever = retriever.with_graph(Arc::new(InMemoryGraphIndex::new(seed.graph)));
    }

    Ok(retriever)
}
