//! Text chunking for index construction
//!
//! Splits source text into overlapping character windows. Window ends are
//! pulled back to the nearest whitespace so words are not cut in half.

/// Sliding-window splitter
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter; the overlap is clamped below the chunk size
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Split text into trimmed, non-empty chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < chars.len() {
            let mut end = (start + self.chunk_size).min(chars.len());

            if end < chars.len() {
                if let Some(ws) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                    if ws > 0 {
                        end = start + ws;
                    }
                }
            }

            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end == chars.len() {
                break;
            }

            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start {
                snap_to_word(&chars, next, end)
            } else {
                end
            };
        }

        chunks
    }
}

/// Move an overlap start forward so it does not begin mid-word
fn snap_to_word(chars: &[char], start: usize, end: usize) -> usize {
    if start == 0 || chars[start - 1].is_whitespace() {
        return start;
    }
    match chars[start..end].iter().position(|c| c.is_whitespace()) {
        Some(pos) => start + pos + 1,
        None => end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::new(100, 10);
        assert_eq!(splitter.split("  Dial 112.  "), vec!["Dial 112."]);
    }

    #[test]
    fn test_empty_text() {
        let splitter = TextSplitter::new(100, 10);
        assert!(splitter.split("   \n ").is_empty());
    }

    #[test]
    fn test_chunks_break_on_whitespace_and_overlap() {
        let splitter = TextSplitter::new(12, 4);
        let chunks = splitter.split("alpha beta gamma delta epsilon");

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 12);
            assert!(!chunk.starts_with(' '));
        }
        assert_eq!(chunks[0], "alpha beta");
        assert_eq!(chunks[1], "beta gamma");
        assert!(chunks.last().unwrap().ends_with("epsilon"));
    }

    #[test]
    fn test_overlap_clamped() {
        let splitter = TextSplitter::new(5, 50);
        // Must terminate even with an oversized overlap
        let chunks = splitter.split("abcdefghijklmnop");
        assert!(!chunks.is_empty());
    }
}
