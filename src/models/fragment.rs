use serde::{Deserialize, Serialize};

/// One retrieved chunk of book metadata: a source identifier, the chunk text,
/// and the page count when the indexer knew it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedFragment {
    pub source: String,
    pub text: String,
    pub pages: Option<i64>,
}

impl RetrievedFragment {
    pub fn new(source: impl Into<String>, text: impl Into<String>, pages: Option<i64>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            pages,
        }
    }
}
