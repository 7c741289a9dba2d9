//! Text chunking with overlap for embedding and retrieval.

use crate::error::ConfigError;
use crate::models::{DocumentChunk, RagConfig};
use crate::utils::has_meaningful_content;

/// Splits extracted text into overlapping fixed-size segments.
///
/// Chunking is deterministic: identical input text and identical
/// (chunk_size, overlap) parameters always produce an identical chunk
/// sequence. Cuts prefer natural boundaries (paragraph break, then
/// sentence end, then word boundary) and fall back to a hard character
/// cut only when the window contains none.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk length in characters.
    chunk_size: usize,
    /// Overlap with the preceding chunk in characters.
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker. Overlap must be strictly smaller than the chunk
    /// size, otherwise the window would never advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &RagConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::new(config.chunk_size as usize, config.chunk_overlap as usize)
    }

    /// Split text into ordered, overlapping chunks.
    ///
    /// Each chunk after the first repeats the final `overlap` characters
    /// of its predecessor, so concatenating the non-overlapping spans
    /// reconstructs the source (whitespace-only windows are dropped).
    pub fn chunk(&self, text: &str) -> Vec<DocumentChunk> {
        let chars: Vec<char> = text.chars().collect();
        let total_chars = chars.len();

        if total_chars == 0 {
            return Vec::new();
        }

        if total_chars <= self.chunk_size {
            return vec![DocumentChunk {
                content: text.to_string(),
                chunk_index: 0,
                total_chunks: 1,
                start_offset: 0,
                end_offset: total_chars as u64,
            }];
        }

        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut start = 0;

        while start < total_chars {
            let target_end = (start + self.chunk_size).min(total_chars);
            let end = self.find_break_point(&chars, target_end, total_chars);
            spans.push((start, end));

            if end >= total_chars {
                break;
            }

            // Advance relative to the actual cut so the next chunk repeats
            // exactly `overlap` characters and nothing is skipped
            let next_start = end.saturating_sub(self.overlap);
            start = if next_start > start { next_start } else { end };
        }

        let chunks: Vec<(String, usize, usize)> = spans
            .into_iter()
            .map(|(s, e)| (chars[s..e].iter().collect::<String>(), s, e))
            .filter(|(content, _, _)| has_meaningful_content(content))
            .collect();

        let total_chunks = chunks.len() as u32;

        chunks
            .into_iter()
            .enumerate()
            .map(|(idx, (content, start_offset, end_offset))| DocumentChunk {
                content,
                chunk_index: idx as u32,
                total_chunks,
                start_offset: start_offset as u64,
                end_offset: end_offset as u64,
            })
            .collect()
    }

    /// Find a natural break point near the target end position, searching
    /// the last 20% of the window. Priority: paragraph break, sentence
    /// end, word boundary; hard cut at `target_end` otherwise.
    fn find_break_point(&self, chars: &[char], target_end: usize, total: usize) -> usize {
        if target_end >= total {
            return total;
        }

        let search_start = target_end.saturating_sub(self.chunk_size / 5);
        let search_range = &chars[search_start..target_end];

        let mut paragraph_break = None;
        let mut last_sentence = None;
        let mut last_word = None;

        for (i, c) in search_range.iter().enumerate() {
            let pos = search_start + i;
            match c {
                '\n' => {
                    if i > 0 && search_range.get(i - 1) == Some(&'\n') {
                        paragraph_break = Some(pos + 1);
                    }
                    last_word = Some(pos + 1);
                }
                '.' | '!' | '?' => {
                    if search_range.get(i + 1).is_some_and(|c| c.is_whitespace()) {
                        last_sentence = Some(pos + 1);
                    }
                }
                ' ' | '\t' => {
                    last_word = Some(pos + 1);
                }
                _ => {}
            }
        }

        paragraph_break
            .or(last_sentence)
            .or(last_word)
            .unwrap_or(target_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(size, overlap).unwrap()
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(100, 150).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunker(1000, 200).chunk("Hello, world!");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello, world!");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].total_chunks, 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunker(1000, 200).chunk("").is_empty());
    }

    #[test]
    fn test_hard_cut_overlap_exact() {
        // 2400 chars, no whitespace: hard cuts at 1000/1800/2400
        let text: String = "abcdefghij".repeat(240);
        let chunks = chunker(1000, 200).chunk(&text);

        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.content.chars().count() <= 1000);
            assert_eq!(chunk.chunk_index, i as u32);
            assert_eq!(chunk.total_chunks, 3);
        }

        // Each chunk after the first shares its leading 200 chars with
        // the previous chunk's trailing 200
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].content.chars().collect();
            let next: Vec<char> = pair[1].content.chars().collect();
            assert_eq!(&prev[prev.len() - 200..], &next[..200]);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "The quick brown fox. Jumps over the lazy dog.\n\nSecond paragraph here. "
            .repeat(40);
        let a = chunker(300, 60).chunk(&text);
        let b = chunker(300, 60).chunk(&text);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.content, y.content);
            assert_eq!(x.start_offset, y.start_offset);
            assert_eq!(x.end_offset, y.end_offset);
        }
    }

    #[test]
    fn test_reconstruction_from_non_overlapping_spans() {
        let text = "Sentence one is here. Sentence two follows it. ".repeat(60);
        let chunks = chunker(400, 100).chunk(&text);
        assert!(chunks.len() > 1);

        let chars: Vec<char> = text.chars().collect();
        let mut rebuilt = String::new();
        let mut covered = 0usize;
        for chunk in &chunks {
            let start = chunk.start_offset as usize;
            assert!(start <= covered, "chunks must not skip content");
            rebuilt.extend(&chars[covered..chunk.end_offset as usize]);
            covered = chunk.end_offset as usize;
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        // One sentence end inside the search window; cut should land
        // right after it instead of mid-word
        let mut text = "x".repeat(950);
        text.push_str(". ");
        text.push_str(&"y".repeat(600));
        let chunks = chunker(1000, 200).chunk(&text);
        assert!(chunks[0].content.ends_with('.'));
        assert!(!chunks[0].content.contains('y'));
    }

    #[test]
    fn test_prefers_paragraph_over_sentence() {
        let mut text = "x".repeat(880);
        text.push_str(". ");
        text.push_str("para end\n\n");
        text.push_str(&"y".repeat(600));
        let chunks = chunker(1000, 200).chunk(&text);
        assert!(chunks[0].content.ends_with("\n\n"));
    }

    #[test]
    fn test_never_exceeds_chunk_size() {
        let text = "word ".repeat(2000);
        for chunk in chunker(257, 31).chunk(&text) {
            assert!(chunk.content.chars().count() <= 257);
        }
    }
}
