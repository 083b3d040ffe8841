use crate::models::Preferences;
use once_cell::sync::Lazy;

/// Maps each mood label to a one-line tone description; included verbatim in
/// every prompt so the model reads the labels the same way the UI defines them.
static MOOD_GUIDE: Lazy<String> = Lazy::new(|| {
    [
        "Mood interpretation guide:",
        "- Cozy: comforting, warm, low-stakes",
        "- Dark: heavier themes, intense tone",
        "- Funny: witty banter, humorous tone, rom-com energy",
        "- Emotional: tearjerker / deep feelings",
        "- Inspirational: uplifting, growth",
        "- Suspenseful: tension, mystery, page-turner",
        "- Wholesome: feel-good, kind characters",
        "- Any: no mood constraint",
    ]
    .join("\n")
});

/// The system instruction: role, the exact response schema, and the
/// closest-match rules. The schema is described here, not enforced — the
/// validator owns enforcement.
pub fn build_system_instruction() -> String {
    r#"You are a book recommendation assistant.

You must respond with valid json only. No extra text.

You must base recommendations on the retrieved context.
If the user's exact request (e.g., "funny romance") is not available, choose the closest matches from the retrieved books and explain why they're the closest fit.

Return json exactly in this schema:
{
  "reading_list": [
    {
      "title": "string",
      "author": "string or null",
      "genre": "string or null",
      "why_it_matches": "1-2 sentences",
      "evidence_from_sources": "short signal from context",
      "estimated_pages": integer or null
    }
  ],
  "follow_up_question": "string"
}

Rules:
- Recommend exactly 5 books.
- If you can't find 5 perfect matches, still return 5 books that are the closest matches available in the retrieved context.
- Never say "I don't know."
- If author/genre/pages are unknown, use null."#
        .to_string()
}

/// The user instruction: the literal question, every preference rendered
/// (even "Any"), the mood guide, and the formatted context.
pub fn build_user_instruction(question: &str, prefs: &Preferences, context: &str) -> String {
    let tropes = if prefs.tropes.is_empty() {
        "None".to_string()
    } else {
        prefs.tropes.join(", ")
    };

    format!(
        "User question: {question}\n\n\
         User preferences:\n\
         - Genre: {genre}\n\
         - Mood: {mood}\n\
         - Pace: {pace}\n\
         - Preferred length: {length}\n\
         - Tropes/tags: {tropes}\n\n\
         {mood_guide}\n\n\
         Context (use this as your source):\n\
         {context}\n\n\
         Reminder: output json only.",
        genre = prefs.genre,
        mood = prefs.mood,
        pace = prefs.pace,
        length = prefs.length_pref,
        mood_guide = *MOOD_GUIDE,
    )
}
