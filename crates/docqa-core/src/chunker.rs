//! Overlapping text splitter.
//!
//! Chunks are measured in characters (Unicode scalar values). Cut points are
//! searched from the size limit backwards: a paragraph break first, then a
//! sentence end, then any whitespace, and only then a hard cut.

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Sentence,
    Whitespace,
}

const BOUNDARY_PREFERENCE: [Boundary; 3] = [Boundary::Paragraph, Boundary::Sentence, Boundary::Whitespace];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than zero".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks of at most `chunk_size` characters where the
    /// last `overlap` characters of each chunk open the next one.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let len = chars.len();
        if len == 0 {
            return Vec::new();
        }
        if len <= self.chunk_size {
            return vec![text.to_string()];
        }

        let byte_at = |i: usize| chars.get(i).map_or(text.len(), |(offset, _)| *offset);
        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let hard_end = start + self.chunk_size;
            if hard_end >= len {
                chunks.push(text[byte_at(start)..].to_string());
                break;
            }
            // Cut no earlier than half a chunk in, and always past the overlap
            // so the next start moves forward.
            let floor = start + (self.overlap + 1).max(self.chunk_size / 2);
            let end = find_cut(&chars, floor, hard_end);
            chunks.push(text[byte_at(start)..byte_at(end)].to_string());
            start = end - self.overlap;
        }
        chunks
    }
}

/// Convenience wrapper over [`TextSplitter`].
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(TextSplitter::new(chunk_size, overlap)?.split(text))
}

fn find_cut(chars: &[(usize, char)], floor: usize, hard_end: usize) -> usize {
    for boundary in BOUNDARY_PREFERENCE {
        if let Some(end) = (floor..=hard_end).rev().find(|&end| is_cut(chars, end, boundary)) {
            return end;
        }
    }
    hard_end
}

/// Whether cutting before `chars[end]` lands on the given kind of boundary.
fn is_cut(chars: &[(usize, char)], end: usize, boundary: Boundary) -> bool {
    let before = |back: usize| end.checked_sub(back).and_then(|i| chars.get(i)).map(|(_, c)| *c);
    match boundary {
        Boundary::Paragraph => before(1) == Some('\n') && before(2) == Some('\n'),
        Boundary::Sentence => {
            before(1).is_some_and(char::is_whitespace) && matches!(before(2), Some('.' | '!' | '?'))
        }
        Boundary::Whitespace => before(1).is_some_and(char::is_whitespace),
    }
}
