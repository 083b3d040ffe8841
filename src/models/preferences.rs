use serde::{Deserialize, Serialize};

fn any() -> String {
    "Any".to_string()
}

/// Reader preferences attached to a single request. Free-form labels with the
/// sentinel "Any" meaning no constraint; tropes may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "any")]
    pub genre: String,
    #[serde(default = "any")]
    pub mood: String,
    #[serde(default = "any")]
    pub pace: String,
    #[serde(default = "any")]
    pub length_pref: String,
    #[serde(default)]
    pub tropes: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            genre: any(),
            mood: any(),
            pace: any(),
            length_pref: any(),
            tropes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_fall_back_to_any() {
        let prefs: Preferences = serde_json::from_str(r#"{"mood": "Cozy"}"#).unwrap();
        assert_eq!(prefs.genre, "Any");
        assert_eq!(prefs.mood, "Cozy");
        assert_eq!(prefs.pace, "Any");
        assert_eq!(prefs.length_pref, "Any");
        assert!(prefs.tropes.is_empty());
    }
}
