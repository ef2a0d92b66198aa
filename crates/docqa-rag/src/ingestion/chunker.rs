//! Fixed-window text chunking with overlap

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Document};

/// Splits documents into overlapping fixed-size chunks.
///
/// Sizes are measured in grapheme clusters; recorded offsets are byte
/// offsets at cluster boundaries, so `&doc.text[char_start..char_end]`
/// reproduces the chunk text exactly. Every non-final chunk is exactly
/// `max_size` clusters long and consecutive chunks share exactly
/// `overlap` clusters. The remainder becomes the final chunk even when
/// it falls short of the configured minimum.
pub struct TextChunker {
    max_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker, rejecting degenerate size/overlap combinations
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            max_size: config.max_size,
            overlap: config.overlap,
        })
    }

    /// Split a document into chunks.
    ///
    /// Empty and whitespace-only documents yield zero chunks so callers
    /// can skip indexing them instead of storing degenerate entries.
    pub fn chunk(&self, doc: &Document) -> Vec<Chunk> {
        let text = doc.text.as_str();
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Grapheme start offsets plus an end sentinel
        let mut bounds: Vec<usize> = text.grapheme_indices(true).map(|(offset, _)| offset).collect();
        bounds.push(text.len());
        let total = bounds.len() - 1;

        if total <= self.max_size {
            return vec![Chunk::new(text, &doc.source_path, 0, 0, text.len())];
        }

        let step = self.max_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.max_size).min(total);

            let char_start = bounds[start];
            let char_end = bounds[end];
            chunks.push(Chunk::new(
                &text[char_start..char_end],
                &doc.source_path,
                chunks.len(),
                char_start,
                char_end,
            ));

            if end == total {
                break;
            }
            start += step;
        }

        debug!(
            source = %doc.source_path,
            chunks = chunks.len(),
            graphemes = total,
            "chunked document"
        );
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentFormat;

    fn chunker(max_size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            max_size,
            overlap,
            min_size: 1,
        })
        .unwrap()
    }

    fn doc(text: &str) -> Document {
        Document::new("docs/sample.txt", DocumentFormat::Text, text)
    }

    fn graphemes(text: &str) -> Vec<&str> {
        text.graphemes(true).collect()
    }

    #[test]
    fn test_short_document_yields_single_chunk() {
        let document = doc("short text");
        let chunks = chunker(100, 10).chunk(&document);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short text");
        assert_eq!(chunks[0].position_index, 0);
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[0].char_end, document.text.len());
    }

    #[test]
    fn test_document_exactly_max_size_is_one_chunk() {
        let document = doc(&"x".repeat(10));
        let chunks = chunker(10, 3).chunk(&document);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_empty_and_whitespace_documents_yield_no_chunks() {
        assert!(chunker(10, 3).chunk(&doc("")).is_empty());
        assert!(chunker(10, 3).chunk(&doc("  \n\t  ")).is_empty());
    }

    #[test]
    fn test_chunk_sizes_and_positions() {
        // 25 graphemes, max 10, overlap 3: starts at 0, 7, 14, 21
        let text: String = ('a'..='y').collect();
        let chunks = chunker(10, 3).chunk(&doc(&text));

        assert_eq!(chunks.len(), 4);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position_index, i);
        }
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(graphemes(&chunk.text).len(), 10);
        }
        // Final chunk carries the remainder
        assert_eq!(graphemes(&chunks[3].text).len(), 4);
    }

    #[test]
    fn test_consecutive_chunks_overlap_exactly() {
        let text: String = ('a'..='z').cycle().take(95).collect();
        let overlap = 7;
        let chunks = chunker(30, overlap).chunk(&doc(&text));
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let prev = graphemes(&pair[0].text);
            let next = graphemes(&pair[1].text);
            assert_eq!(prev[prev.len() - overlap..], next[..overlap]);
        }
    }

    #[test]
    fn test_offsets_round_trip_through_source_text() {
        let text: String = ('a'..='z').cycle().take(120).collect();
        let document = doc(&text);
        let chunks = chunker(50, 12).chunk(&document);

        for chunk in &chunks {
            assert_eq!(&document.text[chunk.char_start..chunk.char_end], chunk.text);
        }
    }

    #[test]
    fn test_multibyte_text_chunks_on_grapheme_boundaries() {
        // Each grapheme is multi-byte; naive byte windows would split them
        let text: String = "héllo wörld çafé ".repeat(20);
        let document = doc(&text);
        let chunks = chunker(40, 10).chunk(&document);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(&document.text[chunk.char_start..chunk.char_end], chunk.text);
        }
        for chunk in &chunks[..chunks.len() - 1] {
            assert_eq!(graphemes(&chunk.text).len(), 40);
        }
    }

    #[test]
    fn test_one_past_max_size_splits_into_two() {
        let text = "x".repeat(11);
        let chunks = chunker(10, 3).chunk(&doc(&text));

        assert_eq!(chunks.len(), 2);
        assert_eq!(graphemes(&chunks[0].text).len(), 10);
        // Second chunk starts at step 7 and runs to the end
        assert_eq!(graphemes(&chunks[1].text).len(), 4);
    }

    #[test]
    fn test_final_chunk_kept_even_below_min_size() {
        // 25 graphemes, max 10, overlap 3: windows at 0, 7, 14, 21.
        // The last window holds 4 graphemes, under a min_size of 5,
        // and is still emitted; only non-final chunks obey the minimum.
        let text: String = ('a'..='y').collect();
        let config = ChunkingConfig {
            max_size: 10,
            overlap: 3,
            min_size: 5,
        };
        let chunks = TextChunker::new(&config).unwrap().chunk(&doc(&text));

        assert_eq!(chunks.len(), 4);
        for chunk in &chunks[..3] {
            assert!(graphemes(&chunk.text).len() >= config.min_size);
        }
        assert_eq!(graphemes(&chunks[3].text).len(), 4);
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let config = ChunkingConfig {
            max_size: 10,
            overlap: 10,
            min_size: 1,
        };
        assert!(TextChunker::new(&config).is_err());
    }
}
