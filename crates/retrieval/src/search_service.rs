//! Azure AI Search document index.
//!
//! Queries the REST search endpoint and selects metadata fields only, so
//! chunk bodies never leave the service.

use async_trait::async_trait;
use quorum_core::error::RetrievalError;
use quorum_core::retrieval::{DocumentIndex, DocumentRecord};
use serde::Deserialize;
use tracing::debug;

const API_VERSION: &str = "2023-11-01";
const SELECT_FIELDS: &str = "title,source,file_id";

pub struct SearchServiceIndex {
    endpoint: String,
    index: String,
    api_key: String,
    client: reqwest::Client,
}

impl SearchServiceIndex {
    pub fn new(
        endpoint: impl Into<String>,
        index: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            index: index.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={API_VERSION}",
            self.endpoint, self.index
        )
    }

    fn request_body(query: &str, limit: usize) -> serde_json::Value {
        serde_json::json!({
            "search": query,
            "top": limit,
            "select": SELECT_FIELDS,
        })
    }
}

#[async_trait]
impl DocumentIndex for SearchServiceIndex {
    fn label(&self) -> &str {
        "Azure AI Search (Categorized)"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<DocumentRecord>, RetrievalError> {
        debug!(index = %self.index, limit, "Querying search service");

        let response = self
            .client
            .post(self.search_url())
            .header("api-key", &self.api_key)
            .json(&Self::request_body(query, limit))
            .send()
            .await
            .map_err(|e| RetrievalError::QueryFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::QueryFailed(format!("status {status}: {body}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(e.to_string()))?;

        Ok(parsed.value.into_iter().map(SearchHit::into_record).collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
    #[serde(rename = "@search.score", default)]
    score: f32,
}

impl SearchHit {
    fn into_record(self) -> DocumentRecord {
        DocumentRecord {
            title: self.title.unwrap_or_else(|| "Unknown".into()),
            file_id: self.file_id,
            source: self.source.unwrap_or_default(),
            content: None,
            score: self.score,
        }
    }
}
