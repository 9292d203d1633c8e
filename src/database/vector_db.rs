use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::time::Duration;
use thiserror::Error;

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2025-01";

#[derive(Error, Debug)]
pub enum VectorDBError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Operation failed: {0}")]
    Operation(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Metadata stored alongside each professor review vector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub stars: Option<f64>,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RetrievalMatch>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

/// Nearest-neighbour lookup seam, mockable in tests.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>, VectorDBError>;
}

#[derive(Clone)]
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    host: String,
    namespace: String,
}

impl PineconeIndex {
    /// Connect to a named index, resolving its data-plane host once up front.
    pub async fn connect(
        api_key: &str,
        index_name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<Self, VectorDBError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VectorDBError::Connection(e.to_string()))?;

        let host = match env::var("PINECONE_INDEX_HOST") {
            Ok(host) => host,
            Err(_) => describe_index_host(&client, api_key, index_name).await?,
        };

        // Clean the host: the data plane wants a bare hostname
        let host = if host.contains("://") {
            host.split("://").nth(1).unwrap_or(&host).to_string()
        } else {
            host
        };

        log::info!("Vector index '{}' resolved to host {}", index_name, host);

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            host,
            namespace: namespace.to_string(),
        })
    }
}

async fn describe_index_host(
    client: &Client,
    api_key: &str,
    index_name: &str,
) -> Result<String, VectorDBError> {
    let url = format!("{}/indexes/{}", CONTROL_PLANE_URL, index_name);

    let response = client
        .get(&url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .map_err(|e| VectorDBError::Connection(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VectorDBError::Connection(format!(
            "describe index failed: status {}, body: {}",
            status, body
        )));
    }

    let description: IndexDescription = response
        .json()
        .await
        .map_err(|e| VectorDBError::Malformed(e.to_string()))?;

    Ok(description.host)
}

#[async_trait]
impl VectorSearch for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<RetrievalMatch>, VectorDBError> {
        let response = self
            .client
            .post(format!("https://{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
                "namespace": self.namespace,
            }))
            .send()
            .await
            .map_err(|e| VectorDBError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorDBError::Operation(format!(
                "query failed: status {}, body: {}",
                status, body
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorDBError::Malformed(e.to_string()))?;

        Ok(parsed.matches)
    }
}
