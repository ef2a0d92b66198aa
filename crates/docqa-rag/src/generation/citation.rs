//! Citation extraction and excerpt shaping

use regex::Regex;
use tracing::warn;

use crate::retrieval::RetrievedChunk;
use crate::types::Citation;

/// Extract citations from a generated answer and link them to chunks.
///
/// Markers like `[C2]` refer to context blocks by position, so `[C1]`
/// maps to `retrieved[0]`. Markers pointing outside the retrieved list
/// are dropped. Duplicates referring to the same `(source, chunk)` pair
/// keep their first occurrence, and the cap applies after
/// deduplication, so distinct sources are never crowded out by repeats.
pub fn extract_citations(
    answer: &str,
    retrieved: &[RetrievedChunk],
    max_citations: usize,
    excerpt_max_chars: usize,
) -> Vec<Citation> {
    // Pattern to match context block markers like [C1]
    let marker_pattern = Regex::new(r"\[C(\d+)\]").expect("Invalid regex");

    let mut citations: Vec<Citation> = Vec::new();

    for cap in marker_pattern.captures_iter(answer) {
        let ordinal: usize = match cap[1].parse() {
            Ok(n) => n,
            Err(_) => continue,
        };
        if ordinal == 0 || ordinal > retrieved.len() {
            warn!(ordinal, available = retrieved.len(), "citation marker out of range");
            continue;
        }

        let chunk = &retrieved[ordinal - 1].chunk;
        let excerpt = make_excerpt(&chunk.text, excerpt_max_chars);
        let citation = Citation::from_chunk(chunk, excerpt);

        if citations.iter().any(|c| c.key() == citation.key()) {
            continue;
        }
        citations.push(citation);
    }

    citations.truncate(max_citations);
    citations
}

/// Shape chunk text into a short excerpt: collapse whitespace runs,
/// then truncate at a word boundary with a trailing ellipsis.
pub fn make_excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.len() <= max_chars {
        return collapsed;
    }

    let mut end = max_chars;
    while end > 0 && !collapsed.is_char_boundary(end) {
        end -= 1;
    }

    if let Some(pos) = collapsed[..end].rfind(' ') {
        return format!("{}...", &collapsed[..pos]);
    }
    format!("{}...", &collapsed[..end])
}
