//! The context retriever.
//!
//! Retrieval never fails from the caller's point of view: an index error
//! is logged and that index contributes nothing. Record bodies are dropped
//! at this boundary; only titles, file ids, source labels and entity
//! names survive into [`RetrievedContext`].

use std::collections::HashSet;
use std::sync::Arc;
use quorum_core::retrieval::{
    DocumentIndex, DocumentRecord, GraphEntity, GraphIndex, SessionCatalog, SessionFile,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::intent;

const HISTORICAL_RENDER_LIMIT: usize = 15;
const GRAPH_RENDER_LIMIT: usize = 10;

/// Whether a document belongs to a file uploaded in this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentScope {
    Session,
    Database,
}

/// Metadata of a retrieved document. Carries no body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
    pub file_id: Option<String>,
    pub source: String,
    pub scope: DocumentScope,
}

/// Everything one retrieval produced for one query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievedContext {
    /// Deduplicated documents, session-scoped first
    pub documents: Vec<DocumentMeta>,
    /// Deduplicated graph entities
    pub graph_entities: Vec<GraphEntity>,
    /// Files active in the session at retrieval time
    pub session_files: Vec<SessionFile>,
    /// Provenance labels of the indexes that returned results
    pub sources_used: Vec<String>,
    /// True when the intent gate suppressed historical documents
    pub historical_hidden: bool,
    pub rendered_text: String,
}

impl RetrievedContext {
    pub fn active_documents(&self) -> impl Iterator<Item = &DocumentMeta> {
        self.documents.iter().filter(|d| d.scope == DocumentScope::Session)
    }

    pub fn historical_documents(&self) -> impl Iterator<Item = &DocumentMeta> {
        self.documents.iter().filter(|d| d.scope == DocumentScope::Database)
    }

    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }

    /// Titles of the first `n` documents.
    pub fn top_titles(&self, n: usize) -> Vec<String> {
        self.documents.iter().take(n).map(|d| d.title.clone()).collect()
    }
}

/// Fans a query out to the configured indexes and renders the result.
pub struct ContextRetriever {
    documents: Option<Arc<dyn DocumentIndex>>,
    graph: Option<Arc<dyn GraphIndex>>,
    session: Option<Arc<dyn SessionCatalog>>,
    document_limit: usize,
    graph_limit: usize,
}

impl ContextRetriever {
    /// A retriever with no indexes attached; every query yields an empty
    /// context.
    pub fn new() -> Self {
        Self {
            documents: None,
            graph: None,
            session: None,
            document_limit: 20,
            graph_limit: 10,
        }
    }

    pub fn with_documents(mut self, index: Arc<dyn DocumentIndex>) -> Self {
        self.documents = Some(index);
        self
    }

    pub fn with_graph(mut self, index: Arc<dyn GraphIndex>) -> Self {
        self.graph = Some(index);
        self
    }

    pub fn with_session(mut self, catalog: Arc<dyn SessionCatalog>) -> Self {
        self.session = Some(catalog);
        self
    }

    pub fn with_limits(mut self, document_limit: usize, graph_limit: usize) -> Self {
        self.document_limit = document_limit;
        self.graph_limit = graph_limit;
        self
    }

    /// Retrieve metadata for `query` from all configured sources.
    pub async fn retrieve(&self, query: &str) -> RetrievedContext {
        let (raw_docs, raw_entities, session_files) = tokio::join!(
            self.search_documents(query),
            self.search_graph(query),
            self.list_session_files(),
        );

        let mut sources_used = Vec::new();
        if !raw_docs.is_empty() {
            if let Some(index) = &self.documents {
                push_unique(&mut sources_used, index.label());
            }
        }
        if !raw_entities.is_empty() {
            if let Some(index) = &self.graph {
                push_unique(&mut sources_used, index.label());
            }
        }

        let active_ids: HashSet<&str> = session_files.iter().map(|f| f.id.as_str()).collect();
        let (active, historical) = split_documents(dedup_documents(&raw_docs), &active_ids);
        let graph_entities = dedup_entities(raw_entities);

        let historical_hidden = intent::hides_historical(query);
        if historical_hidden {
            debug!(hidden = historical.len(), "Session-only query, hiding historical documents");
        }

        let mut documents = active;
        if !historical_hidden {
            documents.extend(historical);
        }

        let mut context = RetrievedContext {
            documents,
            graph_entities,
            session_files,
            sources_used,
            historical_hidden,
            rendered_text: String::new(),
        };
        let nothing_found = raw_docs.is_empty()
            && context.graph_entities.is_empty()
            && context.session_files.is_empty();
        context.rendered_text = render(&context, nothing_found);
        context
    }

    async fn search_documents(&self, query: &str) -> Vec<DocumentRecord> {
        let Some(index) = &self.documents else {
            return Vec::new();
        };
        match index.search(query, self.document_limit).await {
            Ok(mut docs) => {
                docs.truncate(self.document_limit);
                docs
            }
            Err(e) => {
                warn!(
                    index = index.label(),
                    error = %e,
                    "Document index failed, continuing without documents"
                );
                Vec::new()
            }
        }
    }

    async fn search_graph(&self, query: &str) -> Vec<GraphEntity> {
        let Some(index) = &self.graph else {
            return Vec::new();
        };
        match index.search(query, self.graph_limit).await {
            Ok(mut entities) => {
                entities.truncate(self.graph_limit);
                entities
            }
            Err(e) => {
                warn!(
                    index = index.label(),
                    error = %e,
                    "Graph index failed, continuing without entities"
                );
                Vec::new()
            }
        }
    }

    async fn list_session_files(&self) -> Vec<SessionFile> {
        match &self.session {
            Some(catalog) => catalog.list_files().await,
            None => Vec::new(),
        }
    }
}

impl Default for ContextRetriever {
    fn default() -> Self {
        Self::new()
    }
}

fn push_unique(labels: &mut Vec<String>, label: &str) {
    if !labels.iter().any(|l| l == label) {
        labels.push(label.to_string());
    }
}

/// First occurrence of each title wins. Bodies are dropped here.
fn dedup_documents(records: &[DocumentRecord]) -> Vec<(String, Option<String>, String)> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.title.clone()))
        .map(|r| (r.title.clone(), r.file_id.clone(), r.source.clone()))
        .collect()
}

fn split_documents(
    docs: Vec<(String, Option<String>, String)>,
    active_ids: &HashSet<&str>,
) -> (Vec<DocumentMeta>, Vec<DocumentMeta>) {
    let mut active = Vec::new();
    let mut historical = Vec::new();
    for (title, file_id, source) in docs {
        let in_session = file_id.as_deref().is_some_and(|id| active_ids.contains(id));
        let meta = DocumentMeta {
            title,
            file_id,
            source,
            scope: if in_session { DocumentScope::Session } else { DocumentScope::Database },
        };
        if in_session {
            active.push(meta);
        } else {
            historical.push(meta);
        }
    }
    (active, historical)
}

fn dedup_entities(entities: Vec<GraphEntity>) -> Vec<GraphEntity> {
    let mut seen = HashSet::new();
    entities.into_iter().filter(|e| seen.insert(e.name.clone())).collect()
}

fn render(context: &RetrievedContext, nothing_found: bool) -> String {
    let mut parts = vec!["=== DATA SOURCES & METADATA ===".to_string()];

    if context.session_files.is_empty() {
        parts.push("\nNO FILES UPLOADED IN CURRENT SESSION.".into());
    } else {
        parts.push("\nACTIVE SESSION FILES (Source of Truth for 'Currently Uploaded'):".into());
        for f in &context.session_files {
            parts.push(format!("  - [Session] {} (Status: {})", f.filename, f.status));
        }
    }

    let historical: Vec<&DocumentMeta> = context.historical_documents().collect();
    if !historical.is_empty() {
        parts.push("\nPERSISTENT KNOWLEDGE BASE (Historical Metadata in Database):".into());
        for doc in historical.iter().take(HISTORICAL_RENDER_LIMIT) {
            parts.push(format!("  - [Database] {}", doc.title));
        }
    } else if context.historical_hidden {
        parts.push("\n[Historical files hidden to prevent hallucinations on current session query]".into());
    }

    if !context.graph_entities.is_empty() {
        parts.push("\nKNOWLEDGE GRAPH ENTITIES:".into());
        for entity in context.graph_entities.iter().take(GRAPH_RENDER_LIMIT) {
            parts.push(format!("  - [Graph] {}: {}", entity.label, entity.name));
        }
    }

    parts.push("\n--- USAGE INSTRUCTIONS ---".into());
    parts.push("- If results contain both [Session] and [Database] files, distinguish them clearly.".into());
    parts.push("- If user asks about 'Current/Uploaded' items, you MUST refer to [Session] markers.".into());
    parts.push("- If user asks for 'Database/All' items, include [Database] markers.".into());
    parts.push("- If no [Session] files are present, state that clearly before mentioning database history.".into());

    if nothing_found {
        parts.push("No relevant metadata found.".into());
    }

    parts.join("\n")
}
