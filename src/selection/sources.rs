//! Selection sources

use super::{SelectionError, SelectionSource};
use crate::html::text_content;
use crate::text::{char_len, char_slice};

/// Selection given as explicit character offsets into the document
#[derive(Debug, Clone, Copy)]
pub struct OffsetSelection<'a> {
    document: &'a str,
    start: usize,
    end: usize,
}

impl<'a> OffsetSelection<'a> {
    pub fn new(document: &'a str, start: usize, end: usize) -> Self {
        Self { document, start, end }
    }
}

impl SelectionSource for OffsetSelection<'_> {
    fn selected_text(&self) -> Option<&str> {
        char_slice(self.document, self.start, self.end)
    }

    fn offset_of_selection_start(&self) -> Result<usize, SelectionError> {
        let len = char_len(self.document);
        if self.start > self.end || self.end > len {
            return Err(SelectionError::OutOfRange {
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok(self.start)
    }
}

/// Selection as reported by a client: the selected text and where it starts
#[derive(Debug, Clone)]
pub struct ReportedSelection {
    text: String,
    start: usize,
}

impl ReportedSelection {
    pub fn new(text: &str, start: usize) -> Self {
        Self {
            text: text.to_string(),
            start,
        }
    }
}

impl SelectionSource for ReportedSelection {
    fn selected_text(&self) -> Option<&str> {
        Some(&self.text)
    }

    fn offset_of_selection_start(&self) -> Result<usize, SelectionError> {
        Ok(self.start)
    }
}

/// Selection inside rendered highlight markup
///
/// `cut` is the byte position in the markup where the selection starts. The
/// document offset is the length of the text content that precedes it, so
/// wrapper spans and escaped entities are not counted.
#[derive(Debug, Clone, Copy)]
pub struct MarkupSelection<'a> {
    markup: &'a str,
    cut: usize,
    text: &'a str,
}

impl<'a> MarkupSelection<'a> {
    pub fn new(markup: &'a str, cut: usize, text: &'a str) -> Self {
        Self { markup, cut, text }
    }
}

impl SelectionSource for MarkupSelection<'_> {
    fn selected_text(&self) -> Option<&str> {
        Some(self.text)
    }

    fn offset_of_selection_start(&self) -> Result<usize, SelectionError> {
        if self.cut > self.markup.len() || !self.markup.is_char_boundary(self.cut) {
            return Err(SelectionError::InvalidCut(self.cut));
        }
        let before = &self.markup[..self.cut];

        if let Some(lt) = before.rfind('<') {
            if !before[lt..].contains('>') {
                return Err(SelectionError::InsideMarkup(self.cut));
            }
        }
        if let Some(amp) = before.rfind('&') {
            let tail = &before[amp + 1..];
            if tail.chars().all(|c| c.is_ascii_alphanumeric() || c == '#') {
                return Err(SelectionError::InsideMarkup(self.cut));
            }
        }

        Ok(char_len(&text_content(before)?))
    }
}
