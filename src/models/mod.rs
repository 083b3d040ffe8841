use serde::{Deserialize, Serialize};

pub use fragment::RetrievedFragment;
pub use preferences::Preferences;
pub use recommendation::{
    ChatOutcome, ErrorResponse, ReadingListResponse, RecommendationItem, PLACEHOLDER_WHY,
};

mod fragment;
mod preferences;
mod recommendation;

/// Request body for the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The reader's free-text question, e.g. "cozy fantasy like The Hobbit"
    pub question: String,
    /// Structured preferences; every field falls back to "Any" when omitted
    #[serde(default)]
    pub preferences: Preferences,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
}
