//! Character offset helpers
//!
//! Highlight offsets count Unicode scalar values, while Rust strings are
//! indexed by UTF-8 byte. Everything that slices the document goes through
//! these helpers.

use std::ops::Range;

/// Number of characters in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the character at `char_index`
///
/// `char_index == char_len(text)` maps to `text.len()`.
pub fn byte_offset(text: &str, char_index: usize) -> Option<usize> {
    if char_index == 0 {
        return Some(0);
    }
    match text.char_indices().nth(char_index) {
        Some((byte, _)) => Some(byte),
        None if char_len(text) == char_index => Some(text.len()),
        None => None,
    }
}

/// Byte range for a character range, `None` if out of bounds or inverted
pub fn byte_range(text: &str, start: usize, end: usize) -> Option<Range<usize>> {
    if start > end {
        return None;
    }
    let from = byte_offset(text, start)?;
    let to = from + byte_offset(&text[from..], end - start)?;
    Some(from..to)
}

/// Slice `text` by character offsets
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    byte_range(text, start, end).map(|range| &text[range])
}

/// Character offsets of every occurrence of `needle` in `haystack`
pub fn find_all(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    // Every char boundary is tried, so overlapping matches are all reported
    haystack
        .char_indices()
        .enumerate()
        .filter(|(_, (byte, _))| haystack[*byte..].starts_with(needle))
        .map(|(chars_before, _)| chars_before)
        .collect()
}
