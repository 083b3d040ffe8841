pub mod embedder;

pub use embedder::OpenAiEmbedder;
