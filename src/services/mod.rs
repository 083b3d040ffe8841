pub mod chat;
pub mod completion;
pub mod context;
pub mod pinecone;
pub mod prompt;
pub mod reading_time;
pub mod retrieval;
pub mod validator;

// Re-export public types
pub use chat::ChatService;
pub use completion::{CompletionBackend, OpenAiCompletion};
pub use pinecone::PineconeClient;
pub use retrieval::{IndexRetriever, Retriever};

/// The concrete service wired up by the application.
pub type AppChatService = ChatService<IndexRetriever, OpenAiCompletion>;
