use serde::{Deserialize, Serialize};

/// Filler text for list slots the model left empty.
pub const PLACEHOLDER_WHY: &str = "Closest available match from the retrieved context.";

/// One entry of the reading list. `estimated_reading_time_hours` is derived
/// from `estimated_pages` during validation and is never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub why_it_matches: String,
    pub evidence_from_sources: Option<String>,
    pub estimated_pages: Option<i64>,
    pub estimated_reading_time_hours: Option<f64>,
}

impl RecommendationItem {
    /// Padding entry used when the model returned fewer than five items.
    pub fn placeholder() -> Self {
        Self {
            title: None,
            author: None,
            genre: None,
            why_it_matches: PLACEHOLDER_WHY.to_string(),
            evidence_from_sources: None,
            estimated_pages: None,
            estimated_reading_time_hours: None,
        }
    }
}

/// The validated reading list: always exactly five items, in generation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingListResponse {
    pub reading_list: Vec<RecommendationItem>,
    pub follow_up_question: String,
}

/// Pipeline-level failure, with the offending payload kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub raw: String,
}

/// What the chat endpoint hands back to the presentation layer: either a full
/// reading list or an error-plus-raw pair, nothing else. Serialized untagged
/// so the wire shape is exactly one of the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatOutcome {
    ReadingList(ReadingListResponse),
    Failed(ErrorResponse),
}

impl ChatOutcome {
    pub fn failed(error: impl Into<String>, raw: impl Into<String>) -> Self {
        ChatOutcome::Failed(ErrorResponse {
            error: error.into(),
            raw: raw.into(),
        })
    }
}
