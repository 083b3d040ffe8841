use crate::error::Result;
use dotenv::dotenv;
use serde::Deserialize;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Runtime configuration, loaded once at startup from `APP_`-prefixed
/// environment variables (a `.env` file is honored when present).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub pinecone_api_key: String,
    pub pinecone_index_host: String,
    pub top_k: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let settings = config::Config::builder()
            .set_default("port", 3000)?
            .set_default("host", "127.0.0.1")?
            .set_default("openai_base_url", DEFAULT_OPENAI_BASE_URL)?
            .set_default("chat_model", DEFAULT_CHAT_MODEL)?
            .set_default("embedding_model", DEFAULT_EMBEDDING_MODEL)?
            .set_default("temperature", 0.4)?
            .set_default("top_k", 10)?
            .add_source(config::Environment::with_prefix("APP"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }
}
