//! Response chunker — splits reply text at fixed offsets to fit a length ceiling.

/// Discord's hard per-message limit, in characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Split `text` into consecutive slices of at most `limit` characters.
///
/// Slicing happens at fixed offsets and may cut mid-word. Lengths count
/// Unicode scalar values, so no UTF-8 sequence is ever split. Empty text
/// yields no chunks. A `limit` of 0 is treated as 1.
pub fn chunk(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::with_capacity(text.len() / limit + 1);

    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == limit {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_text_splits_at_limit() {
        let text = "a".repeat(5000);
        let chunks = chunk(&text, 2000);

        let lens: Vec<usize> = chunks.iter().map(String::len).collect();
        assert_eq!(lens, vec![2000, 2000, 1000]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(chunk("", 2000).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk("abc", 2000), vec!["abc"]);
    }

    #[test]
    fn test_exact_multiple() {
        let text = "x".repeat(4000);
        let chunks = chunk(&text, DISCORD_MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 2000));
    }

    #[test]
    fn test_cuts_mid_word() {
        assert_eq!(chunk("hello world", 4), vec!["hell", "o wo", "rld"]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let text = "héllo wörld ✓".repeat(3);
        let chunks = chunk(&text, 5);

        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks.len(), text.chars().count().div_ceil(5));
    }

    #[test]
    fn test_zero_limit_clamped() {
        assert_eq!(chunk("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_chunk_count_is_ceiling() {
        for len in [1usize, 7, 1999, 2000, 2001, 6001] {
            let text = "z".repeat(len);
            assert_eq!(chunk(&text, 2000).len(), len.div_ceil(2000), "len {len}");
        }
    }
}
