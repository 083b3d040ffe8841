use crate::error::{ApiError, Result};
use reqwest::{header::HeaderMap, Client};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Thin HTTP client for a Pinecone-style vector index. The runtime pipeline
/// only ever queries; `upsert` exists for the offline index-build binary.
#[derive(Debug, Clone)]
pub struct PineconeClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest {
    pub namespace: Option<String>,
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub include_values: bool,
    pub include_metadata: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub matches: Vec<QueryMatch>,
}

#[derive(Debug, Serialize)]
pub struct UpsertRequest {
    pub vectors: Vec<Vector>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct IndexStats {
    pub dimension: usize,
    #[serde(default)]
    pub namespaces: HashMap<String, NamespaceStats>,
    pub total_vector_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct NamespaceStats {
    pub vector_count: usize,
}

impl PineconeClient {
    pub fn new(api_key: &str, index_host: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Api-Key",
            api_key
                .parse()
                .map_err(|_| ApiError::ConfigError("Index API key is not a valid header value".to_string()))?,
        );
        headers.insert("Accept", "application/json".parse().unwrap());
        headers.insert("Content-Type", "application/json".parse().unwrap());

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: index_host.trim_end_matches('/').to_string(),
        })
    }

    pub async fn query(&self, vector: Vec<f32>, top_k: usize) -> Result<QueryResponse> {
        let request = QueryRequest {
            namespace: None,
            vector,
            top_k,
            include_values: false,
            include_metadata: true,
        };

        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::ExternalServiceError(format!(
                "Index query failed: {error_text}"
            )));
        }

        let query_response = response.json().await?;
        Ok(query_response)
    }

    pub async fn upsert(&self, vectors: Vec<Vector>) -> Result<()> {
        let request = UpsertRequest {
            vectors,
            namespace: None,
        };

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::ExternalServiceError(format!(
                "Index upsert failed: {error_text}"
            )));
        }

        Ok(())
    }

    pub async fn describe_index_stats(&self) -> Result<IndexStats> {
        let response = self
            .client
            .post(format!("{}/describe_index_stats", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::ExternalServiceError(format!(
                "Index stats request failed: {error_text}"
            )));
        }

        let stats = response.json().await?;
        Ok(stats)
    }
}
