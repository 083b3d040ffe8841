use crate::error::Result;
use crate::ml::OpenAiEmbedder;
use crate::models::RetrievedFragment;
use crate::services::pinecone::PineconeClient;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use tracing::{debug, warn};

/// Produces the ranked context fragments for one question. Injected into the
/// orchestrator so tests can swap in a double.
#[async_trait]
pub trait Retriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedFragment>>;
}

/// Embeds the query and searches the vector index. Read-only: the index is
/// built offline and never mutated here.
#[derive(Debug, Clone)]
pub struct IndexRetriever {
    embedder: OpenAiEmbedder,
    index: PineconeClient,
}

/// Metadata stored alongside each indexed vector. Page counts may have been
/// written as numbers or strings depending on the indexer version, so the
/// field is parsed leniently.
#[derive(Debug, Deserialize)]
struct FragmentMetadata {
    #[serde(default, alias = "source_url")]
    source: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pages: Option<i64>,
}

fn deserialize_optional_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
        Null,
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                i64::from_str(s.trim())
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
        StringOrInt::Int(i) => Ok(Some(i)),
        StringOrInt::Null => Ok(None),
    }
}

impl IndexRetriever {
    pub fn new(embedder: OpenAiEmbedder, index: PineconeClient) -> Self {
        Self { embedder, index }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedFragment>> {
        let embedding = self.embedder.encode(query).await?;
        let response = self.index.query(embedding, top_k).await?;

        debug!(matches = response.matches.len(), "Index query returned");

        let fragments = response
            .matches
            .into_iter()
            .filter_map(|m| {
                let Some(metadata) = m.metadata else {
                    warn!("Match {} carried no metadata, skipping", m.id);
                    return None;
                };
                match serde_json::from_value::<FragmentMetadata>(metadata) {
                    Ok(meta) => Some(RetrievedFragment {
                        source: meta.source.unwrap_or_else(|| "unknown".to_string()),
                        text: meta.text.unwrap_or_default(),
                        pages: meta.pages,
                    }),
                    Err(e) => {
                        warn!("Match {} metadata failed to parse: {e}", m.id);
                        None
                    }
                }
            })
            .collect();

        Ok(fragments)
    }
}
