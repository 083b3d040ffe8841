use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Accepted page-count range; anything outside is treated as noise.
const MIN_PAGES: i64 = 50;
const MAX_PAGES: i64 = 2000;

const WORDS_PER_PAGE: f64 = 275.0;
const WORDS_PER_MINUTE: f64 = 250.0;

static PAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)pages:\s*(\d{2,4})").unwrap(),
        Regex::new(r"(?i)(\d{2,4})\s*pages").unwrap(),
    ]
});

/// Extract a plausible page count from an untyped value. Integers are
/// accepted only within [50, 2000]; strings are scanned for `Pages: NNN` /
/// `NNN pages` and the first in-range match wins. Everything else is None —
/// this never fails.
pub fn normalize_pages(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().filter(|p| (MIN_PAGES..=MAX_PAGES).contains(p)),
        Value::String(s) => extract_pages(s),
        _ => None,
    }
}

/// Scan free text for a page-count pattern. Matches from both patterns are
/// considered in text order, so the earliest in-range mention wins.
pub fn extract_pages(text: &str) -> Option<i64> {
    let mut candidates: Vec<(usize, i64)> = Vec::new();
    for pattern in PAGE_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let m = caps.get(1)?;
            if let Ok(pages) = m.as_str().parse::<i64>() {
                candidates.push((m.start(), pages));
            }
        }
    }
    candidates.sort_by_key(|(start, _)| *start);
    candidates
        .into_iter()
        .map(|(_, pages)| pages)
        .find(|p| (MIN_PAGES..=MAX_PAGES).contains(p))
}

/// Derive an estimated reading time in hours from a page count, rounded to
/// one decimal. None when there is no positive page count to derive from.
pub fn estimate_reading_time_hours(pages: Option<i64>) -> Option<f64> {
    let pages = pages.filter(|p| *p > 0)?;
    let minutes = pages as f64 * WORDS_PER_PAGE / WORDS_PER_MINUTE;
    Some((minutes / 60.0 * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers_outside_the_valid_range_are_rejected() {
        assert_eq!(normalize_pages(&json!(312)), Some(312));
        assert_eq!(normalize_pages(&json!(50)), Some(50));
        assert_eq!(normalize_pages(&json!(2000)), Some(2000));
        assert_eq!(normalize_pages(&json!(49)), None);
        assert_eq!(normalize_pages(&json!(2001)), None);
        assert_eq!(normalize_pages(&json!(-10)), None);
        assert_eq!(normalize_pages(&json!(0)), None);
    }

    #[test]
    fn non_scalar_values_yield_none() {
        assert_eq!(normalize_pages(&Value::Null), None);
        assert_eq!(normalize_pages(&json!(312.5)), None);
        assert_eq!(normalize_pages(&json!([312])), None);
        assert_eq!(normalize_pages(&json!({"pages": 312})), None);
    }

    #[test]
    fn page_patterns_are_found_in_free_text() {
        assert_eq!(normalize_pages(&json!("Pages: 312")), Some(312));
        assert_eq!(normalize_pages(&json!("pages:457")), Some(457));
        assert_eq!(normalize_pages(&json!("roughly 310 pages long")), Some(310));
        assert_eq!(normalize_pages(&json!("310 PAGES")), Some(310));
    }

    #[test]
    fn bare_digits_do_not_count_as_a_page_pattern() {
        assert_eq!(normalize_pages(&json!("312")), None);
        assert_eq!(normalize_pages(&json!("published 1999, bestseller")), None);
    }

    #[test]
    fn first_in_range_match_wins() {
        // The 5-digit run never matches; the out-of-range 30 is skipped.
        assert_eq!(
            normalize_pages(&json!("30 pages of notes, then Pages: 412")),
            Some(412)
        );
        assert_eq!(
            normalize_pages(&json!("Pages: 280, reissued at 305 pages")),
            Some(280)
        );
    }

    #[test]
    fn out_of_range_extractions_yield_none() {
        assert_eq!(normalize_pages(&json!("Pages: 49")), None);
        assert_eq!(normalize_pages(&json!("2001 pages")), None);
    }

    #[test]
    fn reading_time_requires_a_positive_page_count() {
        assert_eq!(estimate_reading_time_hours(None), None);
        assert_eq!(estimate_reading_time_hours(Some(0)), None);
        assert_eq!(estimate_reading_time_hours(Some(-5)), None);
    }

    #[test]
    fn reading_time_rounds_to_one_decimal() {
        // 275 pages * 275 words/page / 250 wpm = 302.5 minutes ~= 5.0 hours
        assert_eq!(estimate_reading_time_hours(Some(275)), Some(5.0));
        // 55 pages -> 60.5 minutes -> 1.0 hours
        assert_eq!(estimate_reading_time_hours(Some(55)), Some(1.0));
        assert_eq!(estimate_reading_time_hours(Some(100)), Some(1.8));
    }
}
