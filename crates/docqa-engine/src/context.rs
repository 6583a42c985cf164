//! Character-bounded text helpers for answer composition.

use docqa_core::types::ScoredChunk;

const SEPARATOR: &str = "\n\n";
const ELLIPSIS: &str = "...";

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Retrieved contents joined by blank lines, cut to `max_chars`.
pub fn compose_context(chunks: &[ScoredChunk], max_chars: usize) -> String {
    let joined = chunks
        .iter()
        .map(|scored| scored.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(SEPARATOR);
    truncate_chars(&joined, max_chars).to_string()
}

/// Display form of a chunk: the first `max_chars` characters, with `...`
/// appended when anything was cut.
pub fn snippet(content: &str, max_chars: usize) -> String {
    let head = truncate_chars(content, max_chars);
    if head.len() < content.len() {
        format!("{head}{ELLIPSIS}")
    } else {
        content.to_string()
    }
}
