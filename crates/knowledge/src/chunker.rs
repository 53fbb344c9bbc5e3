//! Overlapping text chunking for similarity indexing.

/// Split `text` into overlapping chunks of roughly `size` characters with
/// `overlap` characters shared between consecutive chunks.
///
/// When a chunk boundary would land mid-word, the break backs up to the
/// nearest whitespace within the tail of the window. All indices are char
/// positions, so multi-byte text never splits inside a code point. For body
/// length L this produces about `ceil(L / (size - overlap))` chunks.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(size > 0 && overlap < size);

    /// How far back from the window end a whitespace break may be.
    const BOUNDARY_WINDOW: usize = 100;

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let mut end = (start + size).min(total);

        if end < total {
            let window_start = end.saturating_sub(BOUNDARY_WINDOW).max(start + 1);
            if let Some(ws) = (window_start..end).rev().find(|&i| chars[i].1.is_whitespace()) {
                end = ws + 1;
            }
        }

        let byte_start = chars[start].0;
        let byte_end = if end == total {
            text.len()
        } else {
            chars[end].0
        };

        let piece = text[byte_start..byte_end].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end == total {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_text("a short body", 1000, 200);
        assert_eq!(chunks, vec!["a short body"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_text("", 1000, 200).is_empty());
        assert!(split_text("   \n ", 1000, 200).is_empty());
    }

    #[test]
    fn chunk_count_tracks_stride() {
        // 4000 chars of word-like text; stride = 1000 - 200 = 800.
        let text = "word ".repeat(800);
        let chunks = split_text(&text, 1000, 200);
        let expected = text.trim().len().div_ceil(800);
        // Whitespace backoff shortens chunks slightly, so allow one extra.
        assert!(
            chunks.len() >= expected && chunks.len() <= expected + 1,
            "got {} chunks, expected about {expected}",
            chunks.len()
        );
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = "word ".repeat(500);
        let chunks = split_text(&text, 1000, 200);
        assert!(chunks.len() >= 2);

        // The head of chunk 2 repeats the tail of chunk 1.
        let tail: String = chunks[0].chars().rev().take(50).collect::<String>();
        let tail: String = tail.chars().rev().collect();
        assert!(chunks[1].starts_with(tail.trim_start()));
    }

    #[test]
    fn breaks_prefer_whitespace() {
        let text = "word ".repeat(500);
        for chunk in split_text(&text, 1000, 200) {
            assert!(chunk.ends_with("word") || chunk.ends_with("word "));
        }
    }

    #[test]
    fn multibyte_text_never_panics() {
        let text = "héllo wörld ".repeat(300);
        let chunks = split_text(&text, 1000, 200);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
        }
    }

    #[test]
    fn unbroken_text_still_chunks() {
        // No whitespace at all: falls back to hard breaks at the size limit.
        let text = "x".repeat(2500);
        let chunks = split_text(&text, 1000, 200);
        assert_eq!(chunks[0].len(), 1000);
        assert!(chunks.len() >= 3);
    }
}
