use crate::config::Config;
use crate::error::{ApiError, Result};
use lazy_static::lazy_static;
use log::{debug, warn};
use ndarray::Array2;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 15;
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 500;
const EMBEDDING_CACHE_LIMIT: usize = 256;

lazy_static! {
    // Process-wide cache; identical queries skip the embeddings endpoint.
    static ref EMBEDDING_CACHE: RwLock<HashMap<String, Vec<f32>>> =
        RwLock::new(HashMap::new());
}

/// Client for a hosted `/v1/embeddings` endpoint. Single texts are cached and
/// retried with backoff; batch requests are used by the index builder.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            endpoint: format!("{}/v1/embeddings", config.openai_base_url),
            model: config.embedding_model.clone(),
        })
    }

    /// Embed a single text, with cache lookup and retry.
    pub async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let key = text.trim().to_string();
        if let Ok(cache) = EMBEDDING_CACHE.read() {
            if let Some(embedding) = cache.get(&key) {
                debug!("Embedding cache hit ({} chars)", key.len());
                return Ok(embedding.clone());
            }
        }

        let mut last_error = None;
        for attempt in 1..=RETRY_ATTEMPTS {
            match self.request_embeddings(&[text]).await {
                Ok(mut embeddings) if !embeddings.is_empty() => {
                    let embedding = embeddings.remove(0);
                    if let Ok(mut cache) = EMBEDDING_CACHE.write() {
                        if cache.len() >= EMBEDDING_CACHE_LIMIT {
                            cache.clear();
                        }
                        cache.insert(key, embedding.clone());
                    }
                    return Ok(embedding);
                }
                Ok(_) => {
                    return Err(ApiError::ModelError(
                        "Embeddings endpoint returned no vectors".to_string(),
                    ))
                }
                Err(e) if attempt < RETRY_ATTEMPTS => {
                    warn!(
                        "Embedding request failed (attempt {attempt}/{RETRY_ATTEMPTS}): {e}. Retrying..."
                    );
                    let delay = RETRY_DELAY_MS * 2u64.pow(attempt - 1);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| ApiError::ModelError("All embedding attempts failed".to_string())))
    }

    /// Embed a batch in one request. Rows come back in input order.
    pub async fn encode_batch(&self, texts: &[String]) -> Result<Array2<f32>> {
        if texts.is_empty() {
            return Err(ApiError::InvalidInput("Empty batch provided".to_string()));
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = self.request_embeddings(&inputs).await?;

        if embeddings.len() != texts.len() {
            return Err(ApiError::ModelError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings[0].len();
        let flat: Vec<f32> = embeddings.into_iter().flatten().collect();
        Array2::from_shape_vec((texts.len(), dimension), flat)
            .map_err(|e| ApiError::ModelError(format!("Failed to shape embeddings: {e}")))
    }

    async fn request_embeddings(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs.to_vec(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::ModelError(format!("Embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ApiError::ModelError(
                    "Authentication failed. Check the embeddings API key.".to_string(),
                ),
                429 => ApiError::ModelError(
                    "Rate limit exceeded on the embeddings endpoint.".to_string(),
                ),
                _ => ApiError::ModelError(format!(
                    "Embeddings endpoint returned {status}: {text}"
                )),
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ModelError(format!("Failed to parse embeddings: {e}")))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
