use crate::models::{ChatOutcome, ReadingListResponse, RecommendationItem};
use crate::services::reading_time::{estimate_reading_time_hours, normalize_pages};
use serde_json::Value;

pub const INVALID_JSON_ERROR: &str = "Model did not return valid JSON. Here is the raw output:";
pub const MISSING_LIST_ERROR: &str = "JSON returned but reading_list is missing/empty. Raw output:";
pub const DEFAULT_FOLLOW_UP: &str = "Want me to refine by mood, length, or trope?";

const LIST_LENGTH: usize = 5;

/// Turn the model's raw text payload into a guaranteed five-item reading
/// list, or an error outcome carrying the payload for diagnosis.
///
/// Local anomalies (wrong cardinality, missing fields, junk page counts) are
/// repaired silently; only an unparsable payload or an absent/empty list is
/// surfaced. Running this on its own serialized output changes nothing.
pub fn repair_response(raw: &str) -> ChatOutcome {
    let data: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => return ChatOutcome::failed(INVALID_JSON_ERROR, raw),
    };

    let Some(items) = data.get("reading_list").and_then(Value::as_array) else {
        return ChatOutcome::failed(MISSING_LIST_ERROR, raw);
    };
    if items.is_empty() {
        return ChatOutcome::failed(MISSING_LIST_ERROR, raw);
    }

    let mut reading_list: Vec<RecommendationItem> =
        items.iter().take(LIST_LENGTH).map(repair_item).collect();
    while reading_list.len() < LIST_LENGTH {
        reading_list.push(RecommendationItem::placeholder());
    }

    let follow_up_question = data
        .get("follow_up_question")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_FOLLOW_UP.to_string());

    ChatOutcome::ReadingList(ReadingListResponse {
        reading_list,
        follow_up_question,
    })
}

/// Map one untyped list entry into a RecommendationItem, normalizing the page
/// count (with a fallback scan of the evidence text) and deriving the
/// reading-time estimate from it.
fn repair_item(item: &Value) -> RecommendationItem {
    let evidence_from_sources = string_field(item, "evidence_from_sources");

    let mut estimated_pages = normalize_pages(item.get("estimated_pages").unwrap_or(&Value::Null));
    if estimated_pages.is_none() {
        if let Some(evidence) = &evidence_from_sources {
            estimated_pages = normalize_pages(&Value::String(evidence.clone()));
        }
    }

    RecommendationItem {
        title: string_field(item, "title"),
        author: string_field(item, "author"),
        genre: string_field(item, "genre"),
        why_it_matches: string_field(item, "why_it_matches").unwrap_or_default(),
        evidence_from_sources,
        estimated_reading_time_hours: estimate_reading_time_hours(estimated_pages),
        estimated_pages,
    }
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorResponse, PLACEHOLDER_WHY};
    use serde_json::json;

    fn payload_with_items(n: usize) -> String {
        let items: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "title": format!("Book {i}"),
                    "author": "Author",
                    "genre": "Fantasy",
                    "why_it_matches": "Fits the request.",
                    "evidence_from_sources": "Listed in the retrieved context.",
                    "estimated_pages": 300 + i
                })
            })
            .collect();
        json!({"reading_list": items, "follow_up_question": "More?"}).to_string()
    }

    fn expect_list(outcome: ChatOutcome) -> ReadingListResponse {
        match outcome {
            ChatOutcome::ReadingList(list) => list,
            ChatOutcome::Failed(err) => panic!("expected reading list, got error: {}", err.error),
        }
    }

    fn expect_failure(outcome: ChatOutcome) -> ErrorResponse {
        match outcome {
            ChatOutcome::Failed(err) => err,
            ChatOutcome::ReadingList(_) => panic!("expected failure, got reading list"),
        }
    }

    #[test]
    fn unparsable_payload_keeps_the_raw_text() {
        let err = expect_failure(repair_response("not json"));
        assert_eq!(err.error, INVALID_JSON_ERROR);
        assert_eq!(err.raw, "not json");
    }

    #[test]
    fn missing_or_empty_list_is_an_error() {
        let raw = r#"{"follow_up_question": "?"}"#;
        let err = expect_failure(repair_response(raw));
        assert_eq!(err.error, MISSING_LIST_ERROR);
        assert_eq!(err.raw, raw);

        let raw = r#"{"reading_list": []}"#;
        let err = expect_failure(repair_response(raw));
        assert_eq!(err.error, MISSING_LIST_ERROR);

        let raw = r#"{"reading_list": "surprise"}"#;
        let err = expect_failure(repair_response(raw));
        assert_eq!(err.error, MISSING_LIST_ERROR);
    }

    #[test]
    fn short_lists_are_padded_to_exactly_five() {
        for n in 1..=4 {
            let list = expect_list(repair_response(&payload_with_items(n)));
            assert_eq!(list.reading_list.len(), 5);
            for (i, item) in list.reading_list.iter().take(n).enumerate() {
                assert_eq!(item.title.as_deref(), Some(format!("Book {i}").as_str()));
            }
            for item in &list.reading_list[n..] {
                assert_eq!(item, &RecommendationItem::placeholder());
                assert_eq!(item.why_it_matches, PLACEHOLDER_WHY);
            }
        }
    }

    #[test]
    fn long_lists_are_truncated_in_order() {
        for n in [5usize, 6, 10] {
            let list = expect_list(repair_response(&payload_with_items(n)));
            assert_eq!(list.reading_list.len(), 5);
            for (i, item) in list.reading_list.iter().enumerate() {
                assert_eq!(item.title.as_deref(), Some(format!("Book {i}").as_str()));
            }
        }
    }

    #[test]
    fn pages_fall_back_to_the_evidence_text() {
        let raw = json!({
            "reading_list": [{
                "title": "Mistborn",
                "why_it_matches": "Heist fantasy.",
                "evidence_from_sources": "Context notes Pages: 312 for this one."
            }],
            "follow_up_question": "More?"
        })
        .to_string();

        let list = expect_list(repair_response(&raw));
        assert_eq!(list.reading_list[0].estimated_pages, Some(312));
        assert_eq!(list.reading_list[0].estimated_reading_time_hours, Some(5.7));
    }

    #[test]
    fn junk_page_counts_are_nulled_not_errored() {
        let raw = json!({
            "reading_list": [
                {"title": "A", "why_it_matches": "w", "estimated_pages": 49},
                {"title": "B", "why_it_matches": "w", "estimated_pages": 2001},
                {"title": "C", "why_it_matches": "w", "estimated_pages": "a few hundred"},
                {"title": "D", "why_it_matches": "w", "estimated_pages": null},
                {"title": "E", "why_it_matches": "w", "estimated_pages": 312}
            ]
        })
        .to_string();

        let list = expect_list(repair_response(&raw));
        for item in &list.reading_list[..4] {
            assert_eq!(item.estimated_pages, None);
            assert_eq!(item.estimated_reading_time_hours, None);
        }
        assert_eq!(list.reading_list[4].estimated_pages, Some(312));
        assert!(list.reading_list[4].estimated_reading_time_hours.is_some());
    }

    #[test]
    fn reading_time_is_present_exactly_when_pages_are() {
        let list = expect_list(repair_response(&payload_with_items(3)));
        for item in &list.reading_list {
            assert_eq!(
                item.estimated_pages.is_some(),
                item.estimated_reading_time_hours.is_some()
            );
        }
    }

    #[test]
    fn follow_up_question_defaults_when_absent_or_not_text() {
        let raw = json!({"reading_list": [{"title": "A", "why_it_matches": "w"}]}).to_string();
        let list = expect_list(repair_response(&raw));
        assert_eq!(list.follow_up_question, DEFAULT_FOLLOW_UP);

        let raw = json!({
            "reading_list": [{"title": "A", "why_it_matches": "w"}],
            "follow_up_question": 42
        })
        .to_string();
        let list = expect_list(repair_response(&raw));
        assert_eq!(list.follow_up_question, DEFAULT_FOLLOW_UP);
    }

    #[test]
    fn repair_is_idempotent_on_its_own_output() {
        let first = expect_list(repair_response(&payload_with_items(3)));
        let reserialized = serde_json::to_string(&first).unwrap();
        let second = expect_list(repair_response(&reserialized));
        assert_eq!(first, second);
    }
}
