//! Character-window chunking with sentence-boundary snapping
//!
//! Documents are split into fixed-size character windows. A window
//! boundary that lands mid-sentence is pulled back to the nearest
//! preceding sentence terminator, but only if that terminator sits at or
//! after the window midpoint — snapping earlier would produce degenerate
//! tiny chunks. Consecutive chunks share `overlap` characters.

/// Split `text` into chunks of at most `chunk_size` characters.
///
/// `overlap >= chunk_size` would stop the window from advancing; it is
/// clamped to `chunk_size - 1` and logged as a caller bug.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    let overlap = if overlap >= chunk_size {
        tracing::warn!(
            chunk_size,
            overlap,
            "overlap >= chunk_size, clamping to chunk_size - 1"
        );
        chunk_size - 1
    } else {
        overlap
    };

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let window_end = (start + chunk_size).min(total);
        let mut end = window_end;

        // Only interior windows snap; the final window keeps its raw end.
        if window_end < total {
            if let Some(term) = last_terminator(&chars, start, window_end) {
                if term >= start + chunk_size / 2 {
                    end = term + 1;
                }
            }
        }

        chunks.push(chars[start..end].iter().collect());
        if end >= total {
            break;
        }
        // end - overlap normally; the max() guard keeps the window
        // advancing even in degenerate configurations
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

/// Index of the last sentence terminator in `chars[start..end]`: a `.`,
/// `!` or `?` followed by a space, or the first newline of a blank line.
fn last_terminator(chars: &[char], start: usize, end: usize) -> Option<usize> {
    if end == 0 {
        return None;
    }
    (start..end.saturating_sub(1)).rev().find(|&i| {
        let next = chars[i + 1];
        (matches!(chars[i], '.' | '!' | '?') && next == ' ') || (chars[i] == '\n' && next == '\n')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drop each chunk's `overlap`-char prefix (except the first) and
    /// concatenate; must reproduce the input exactly.
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                out.extend(chunk.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 500, 50).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("hello world", 500, 50);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn round_trip_reconstructs_input() {
        let text = "One sentence here. Another follows! A question? \
                    Then a longer stretch of prose without terminators \
                    just to push the window forward. And one more. The end."
            .repeat(4);
        let overlap = 10;
        let chunks = chunk_text(&text, 50, overlap);
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks, overlap), text);
    }

    #[test]
    fn chunks_never_exceed_chunk_size() {
        let text = "word ".repeat(500);
        for chunk in chunk_text(&text, 64, 8) {
            assert!(chunk.chars().count() <= 64);
        }
    }

    #[test]
    fn snaps_to_sentence_boundary_past_midpoint() {
        // Terminator at index 39 of a 50-char window: past the midpoint,
        // so the first chunk must end just after the period.
        let text = format!("{}. {}", "a".repeat(38), "b".repeat(60));
        let chunks = chunk_text(&text, 50, 0);
        assert!(chunks[0].ends_with('.'));
        assert_eq!(chunks[0].chars().count(), 39);
    }

    #[test]
    fn ignores_terminator_before_midpoint() {
        // Terminator at index 4: before the midpoint of a 50-char window,
        // so the raw boundary is kept.
        let text = format!("abc. {}", "d".repeat(100));
        let chunks = chunk_text(&text, 50, 0);
        assert_eq!(chunks[0].chars().count(), 50);
    }

    #[test]
    fn terminates_with_maximal_valid_overlap() {
        let text = "x".repeat(2_000);
        let chunks = chunk_text(&text, 10, 9);
        // advance is at least size - overlap = 1 per step
        assert!(chunks.len() <= 2_000);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn clamps_overlap_at_or_above_chunk_size() {
        let text = "y".repeat(300);
        // would never advance without the clamp
        let chunks = chunk_text(&text, 10, 25);
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= 300);
    }

    #[test]
    fn handles_multibyte_text() {
        let text = "héllo wörld. ".repeat(30);
        let chunks = chunk_text(&text, 40, 5);
        assert!(!chunks.is_empty());
        assert_eq!(reconstruct(&chunks, 5), text);
    }
}
