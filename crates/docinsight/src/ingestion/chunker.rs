//! Text chunking with overlap and natural-boundary preference
//!
//! Chunks are exact character spans of the source text. Consecutive spans
//! overlap by at most `overlap` chars (at least one when overlap is
//! non-zero), so the source can be rebuilt from the non-overlapping parts.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::types::Chunk;

/// Text chunker with configurable size and overlap (both in chars)
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into ordered, overlapping chunks
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the text
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        if total <= self.chunk_size {
            return vec![Chunk {
                index: 0,
                content: text.to_string(),
                char_start: 0,
                char_end: total,
            }];
        }

        let chars: Vec<char> = text.chars().collect();
        let boundaries = Boundaries::scan(text, &chars, &offsets);

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let hard_end = (start + self.chunk_size).min(total);

            let end = if hard_end == total {
                total
            } else {
                // Never split so early that the overlap would stall progress
                let min_end = start + (self.overlap + 1).max(self.chunk_size / 2);
                boundaries.best_in(min_end, hard_end).unwrap_or(hard_end)
            };

            chunks.push(Chunk {
                index: chunks.len(),
                content: text[offsets[start]..offsets[end]].to_string(),
                char_start: start,
                char_end: end,
            });

            if end == total {
                break;
            }

            start = self.overlap_start(&chars, end);
        }

        tracing::debug!(
            chunks = chunks.len(),
            chars = total,
            chunk_size = self.chunk_size,
            overlap = self.overlap,
            "text chunked"
        );

        chunks
    }

    /// Start of the next chunk: the earliest word start inside the overlap
    /// window, or exactly `overlap` chars back when there is none.
    fn overlap_start(&self, chars: &[char], end: usize) -> usize {
        if self.overlap == 0 {
            return end;
        }

        let earliest = end - self.overlap;
        (earliest..end)
            .find(|&p| chars[p - 1].is_whitespace() && !chars[p].is_whitespace())
            .unwrap_or(earliest)
    }
}

/// Candidate split positions (char offsets), grouped by preference
struct Boundaries {
    /// After a blank line
    paragraph: Vec<usize>,
    /// After a newline
    line: Vec<usize>,
    /// Start of a sentence
    sentence: Vec<usize>,
    /// Start of a word following whitespace
    word: Vec<usize>,
}

impl Boundaries {
    fn scan(text: &str, chars: &[char], offsets: &[usize]) -> Self {
        let mut paragraph = Vec::new();
        let mut line = Vec::new();
        let mut word = Vec::new();

        for p in 1..chars.len() {
            let prev = chars[p - 1];
            if prev == '\n' {
                line.push(p);
                if p >= 2 && chars[p - 2] == '\n' {
                    paragraph.push(p);
                }
            }
            if prev.is_whitespace() && !chars[p].is_whitespace() {
                word.push(p);
            }
        }

        let sentence = text
            .split_sentence_bound_indices()
            .filter_map(|(byte, _)| offsets.binary_search(&byte).ok())
            .filter(|&p| p > 0)
            .collect();

        Self {
            paragraph,
            line,
            sentence,
            word,
        }
    }

    /// Best boundary within `lo..=hi`: highest priority level first, then
    /// the latest position within that level.
    fn best_in(&self, lo: usize, hi: usize) -> Option<usize> {
        [&self.paragraph, &self.line, &self.sentence, &self.word]
            .into_iter()
            .find_map(|level| {
                let idx = level.partition_point(|&p| p <= hi);
                (idx > 0 && level[idx - 1] >= lo).then(|| level[idx - 1])
            })
    }
}
