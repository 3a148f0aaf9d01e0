//! In-memory indexes: used by tests and by the local CLI with a seed file.

use async_trait::async_trait;
use quorum_core::error::RetrievalError;
use quorum_core::retrieval::{
    DocumentIndex, DocumentRecord, GraphEntity, GraphIndex, SessionCatalog, SessionFile,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Lowercased query terms worth matching on.
fn terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2)
        .map(String::from)
        .collect()
}

/// Number of distinct query terms found in `haystack`.
fn keyword_score(terms: &[String], haystack: &str) -> usize {
    let haystack = haystack.to_lowercase();
    terms.iter().filter(|t| haystack.contains(t.as_str())).count()
}

/// Keyword search over a list of document records.
pub struct InMemoryDocumentIndex {
    label: String,
    records: Arc<RwLock<Vec<DocumentRecord>>>,
}

impl InMemoryDocumentIndex {
    pub fn new(records: Vec<DocumentRecord>) -> Self {
        Self {
            label: "In-Memory Documents".into(),
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub async fn add(&self, record: DocumentRecord) {
        self.records.write().await.push(record);
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl DocumentIndex for InMemoryDocumentIndex {
    fn label(&self) -> &str {
        &self.label
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, RetrievalError> {
        let terms = terms(query);
        let records = self.records.read().await;

        let mut results: Vec<DocumentRecord> = records
            .iter()
            .filter_map(|r| {
                let text = format!(
                    "{} {} {}",
                    r.title,
                    r.source,
                    r.content.as_deref().unwrap_or("")
                );
                let hits = keyword_score(&terms, &text);
                (hits > 0).then(|| {
                    let mut r = r.clone();
                    r.score = hits as f32 / terms.len().max(1) as f32;
                    r
                })
            })
            .collect();

        // stable: ties keep insertion order
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        Ok(results)
    }
}

/// Name/label keyword search over graph entities.
pub struct InMemoryGraphIndex {
    label: String,
    entities: Vec<GraphEntity>,
}

impl InMemoryGraphIndex {
    pub fn new(entities: Vec<GraphEntity>) -> Self {
        Self {
            label: "In-Memory Graph".into(),
            entities,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl GraphIndex for InMemoryGraphIndex {
    fn label(&self) -> &str {
        &self.label
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<GraphEntity>, RetrievalError> {
        let terms = terms(query);
        Ok(self
            .entities
            .iter()
            .filter(|e| keyword_score(&terms, &format!("{} {}", e.name, e.label)) > 0)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// The files uploaded in the current session.
#[derive(Default)]
pub struct InMemorySessionCatalog {
    files: RwLock<Vec<SessionFile>>,
}

impl InMemorySessionCatalog {
    pub fn new(files: Vec<SessionFile>) -> Self {
        Self {
            files: RwLock::new(files),
        }
    }

    /// Add or replace a file by id.
    pub async fn upsert(&self, file: SessionFile) {
        let mut files = self.files.write().await;
        match files.iter_mut().find(|f| f.id == file.id) {
            Some(existing) => *existing = file,
            None => files.push(file),
        }
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut files = self.files.write().await;
        let before = files.len();
        files.retain(|f| f.id != id);
        files.len() < before
    }
}

#[async_trait]
impl SessionCatalog for InMemorySessionCatalog {
    async fn list_files(&self) -> Vec<SessionFile> {
        self.files.read().await.clone()
    }
}

/// Contents of a JSON seed file for the in-memory indexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub graph: Vec<GraphEntity>,
    #[serde(default)]
    pub session_files: Vec<SessionFile>,
}

impl SeedData {
    pub fn load(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::NotConfigured(format!("cannot read seed file {}: {e}", path.display()))
        })?;
        let seed: Self = serde_json::from_str(&content).map_err(|e| {
            RetrievalError::InvalidResponse(format!("malformed seed file {}: {e}", path.display()))
        })?;
        debug!(
            path = %path.display(),
            documents = seed.documents.len(),
            entities = seed.graph.len(),
            session_files = seed.session_files.len(),
            "Loaded retrieval seed"
        );
        Ok(seed)
    }
}
