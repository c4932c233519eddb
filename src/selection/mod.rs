//! Selection mapping
//!
//! Converts a user's text selection into a candidate highlight
//! `(start_index, end_index, text)` relative to the full document. Where the
//! selection comes from (explicit offsets, a browser report, or a cut point
//! in rendered markup) is abstracted behind [`SelectionSource`].

mod sources;

use thiserror::Error;

use crate::annotations::SelectionPayload;
use crate::html::RenderError;
use crate::text::char_len;

pub use sources::{MarkupSelection, OffsetSelection, ReportedSelection};

/// Errors while measuring a selection
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Selection range {start}..{end} is outside the document ({len} chars)")]
    OutOfRange { start: usize, end: usize, len: usize },

    #[error("Cut point {0} is not a valid position in the markup")]
    InvalidCut(usize),

    #[error("Cut point {0} falls inside a tag or entity")]
    InsideMarkup(usize),

    #[error("Failed to read rendered markup: {0}")]
    Markup(#[from] RenderError),
}

/// Something that can report a text selection
pub trait SelectionSource {
    /// The selected text, if any
    fn selected_text(&self) -> Option<&str>;

    /// Character offset of the selection start within the whole document
    fn offset_of_selection_start(&self) -> Result<usize, SelectionError>;
}

/// Map a selection to a highlight payload
///
/// Empty or collapsed selections and selections that cannot be measured
/// yield `None`; neither is an error for the caller. Bounds are not checked
/// here, that is the store's job.
pub fn map_selection<S: SelectionSource + ?Sized>(source: &S) -> Option<SelectionPayload> {
    let text = source.selected_text()?;
    if text.trim().is_empty() {
        return None;
    }

    let start = match source.offset_of_selection_start() {
        Ok(start) => start,
        Err(e) => {
            tracing::debug!(error = %e, "Could not map selection");
            return None;
        }
    };

    let Some(end) = start.checked_add(char_len(text)) else {
        tracing::debug!(start = start, "Selection end overflows, ignoring selection");
        return None;
    };

    Some(SelectionPayload {
        text: text.to_string(),
        start_index: start,
        end_index: end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Detached;

    impl SelectionSource for Detached {
        fn selected_text(&self) -> Option<&str> {
            Some("indemnify")
        }

        fn offset_of_selection_start(&self) -> Result<usize, SelectionError> {
            Err(SelectionError::InvalidCut(usize::MAX))
        }
    }

    #[test]
    fn test_failed_measurement_is_a_no_op() {
        assert!(map_selection(&Detached).is_none());
    }

    #[test]
    fn test_blank_selection_is_a_no_op() {
        let selection = ReportedSelection::new("   ", 3);
        assert!(map_selection(&selection).is_none());
    }

    #[test]
    fn test_overflowing_end_is_a_no_op() {
        let selection = ReportedSelection::new("30 days", usize::MAX - 3);
        assert!(map_selection(&selection).is_none());

        let edge = ReportedSelection::new("30 days", usize::MAX - 7);
        assert_eq!(map_selection(&edge).unwrap().end_index, usize::MAX);
    }

    #[test]
    fn test_end_follows_text_length() {
        let selection = ReportedSelection::new("délai", 12);
        let payload = map_selection(&selection).unwrap();
        assert_eq!(payload.start_index, 12);
        assert_eq!(payload.end_index, 17);
    }
}
