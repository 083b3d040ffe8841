use crate::models::RetrievedFragment;

/// Most characters of one fragment that make it into the prompt.
const FRAGMENT_CHAR_LIMIT: usize = 1200;

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Collapse retrieved fragments, in rank order, into a single bounded prompt
/// context. Blank fragments are dropped and each text is cut at 1200
/// characters. An empty return value means there is no usable context and the
/// caller must not spend a completion call on it.
pub fn format_context<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a RetrievedFragment>,
{
    let mut blocks = Vec::new();
    for fragment in fragments {
        let text = fragment.text.trim();
        if text.is_empty() {
            continue;
        }
        let text = truncate_chars(text, FRAGMENT_CHAR_LIMIT);

        let header = match fragment.pages {
            Some(pages) => format!("Source: {} [Pages: {}]", fragment.source, pages),
            None => format!("Source: {}", fragment.source),
        };
        blocks.push(format!("{header}\n{text}"));
    }
    blocks.join(BLOCK_SEPARATOR)
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
