use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::CONFIG;
use crate::data_models::CourseDocument;

/// One page of hits from the engine, in engine order.
#[derive(Debug)]
pub struct SearchPage<T> {
    pub total: u64,
    pub docs: Vec<T>,
}

/// Thin wrapper around the Elasticsearch HTTP API.
///
/// Owns a single long-lived `reqwest::Client`; connection pooling and
/// timeouts live there. Constructed once at startup and passed into the
/// components that need it.
#[derive(Debug, Clone)]
pub struct EsClient {
    http: reqwest::Client,
    base_url: String,
    index: String,
}

impl EsClient {
    /// Create a client for a given cluster URL and index name.
    /// Does not touch the network; call `ping` to verify connectivity.
    pub fn new(base_url: &str, index: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        }
    }

    /// Create a client from environment configuration and verify the
    /// cluster is reachable.
    pub async fn from_config() -> Result<Self> {
        let client = Self::new(&CONFIG.es_url, &CONFIG.es_index);
        client.ping().await?;
        log::info!(
            "Connected to Elasticsearch at {} (index: {})",
            client.base_url,
            client.index
        );
        Ok(client)
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Verify the cluster answers on its root endpoint.
    pub async fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(&self.base_url)
            .send()
            .await
            .context("Failed to connect to Elasticsearch")?;

        if !response.status().is_success() {
            anyhow::bail!("Elasticsearch ping returned {}", response.status());
        }
        Ok(())
    }

    /// Create the course index with its mapping. Already-existing index is
    /// not an error.
    pub async fn ensure_index(&self) -> Result<()> {
        let mapping = json!({
            "mappings": {
                "properties": {
                    "id": { "type": "keyword" },
                    "title": { "type": "text", "analyzer": "standard" },
                    "description": { "type": "text", "analyzer": "standard" },
                    "category": { "type": "keyword" },
                    "type": { "type": "keyword" },
                    "gradeRange": { "type": "keyword" },
                    "minAge": { "type": "integer" },
                    "maxAge": { "type": "integer" },
                    "price": { "type": "double" },
                    "nextSessionDate": { "type": "date" },
                    "titleSuggest": { "type": "search_as_you_type" }
                }
            }
        });

        let url = format!("{}/{}", self.base_url, self.index);
        let response = self
            .http
            .put(&url)
            .json(&mapping)
            .send()
            .await
            .context("Failed to create index")?;

        if response.status().is_success() {
            log::info!("Created index {}", self.index);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if body.contains("resource_already_exists_exception") {
            log::info!("Index {} already exists", self.index);
            return Ok(());
        }
        anyhow::bail!("Index creation failed: {}", body)
    }

    /// Number of documents currently in the index.
    pub async fn count(&self) -> Result<u64> {
        let url = format!("{}/{}/_count", self.base_url, self.index);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to count documents")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Count failed: {}", body);
        }

        let body: Value = response.json().await.context("Invalid count response")?;
        body.get("count")
            .and_then(|c| c.as_u64())
            .context("Invalid count response")
    }

    /// Bulk-index course documents by id, then refresh so they are
    /// immediately searchable.
    pub async fn bulk_index(&self, courses: &[CourseDocument]) -> Result<()> {
        let mut body = String::new();
        for course in courses {
            let action = json!({ "index": { "_index": self.index, "_id": course.id } });
            body.push_str(&action.to_string());
            body.push('\n');
            body.push_str(&serde_json::to_string(course)?);
            body.push('\n');
        }

        let url = format!("{}/_bulk", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("content-type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .context("Bulk indexing failed")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Bulk indexing failed: {}", body);
        }

        let result: Value = response.json().await.context("Invalid bulk response")?;
        if result.get("errors").and_then(|e| e.as_bool()) == Some(true) {
            anyhow::bail!("Bulk indexing reported item failures: {}", result);
        }

        self.refresh().await
    }

    /// Make recent writes visible to search.
    pub async fn refresh(&self) -> Result<()> {
        let url = format!("{}/{}/_refresh", self.base_url, self.index);
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .context("Refresh failed")?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Refresh failed: {}", body);
        }
        Ok(())
    }

    /// Execute one `_search` request and decode the page of `_source`
    /// documents along with the total hit count.
    pub async fn search<T: DeserializeOwned>(&self, body: &Value) -> Result<SearchPage<T>> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .context("Search request failed")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Search failed: {}", error_text);
        }

        let result: Value = response.json().await.context("Invalid search response")?;

        let total = result
            .get("hits")
            .and_then(|h| h.get("total"))
            .and_then(|t| t.get("value"))
            .and_then(|v| v.as_u64())
            .context("Invalid search response: missing hits.total")?;

        let hits = result
            .get("hits")
            .and_then(|h| h.get("hits"))
            .and_then(|h| h.as_array())
            .context("Invalid search response: missing hits")?;

        let docs = hits
            .iter()
            .filter_map(|hit| hit.get("_source"))
            .map(|source| serde_json::from_value(source.clone()))
            .collect::<Result<Vec<T>, _>>()
            .context("Failed to decode search hit")?;

        Ok(SearchPage { total, docs })
    }
}
