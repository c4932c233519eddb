//! Annotation error types

use thiserror::Error;

/// Errors raised by the category registry and highlight store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    /// Category id not present in the registry
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Category name is empty after trimming
    #[error("Invalid category name: {0:?}")]
    InvalidCategoryName(String),

    /// Color is not a `#RRGGBB` value
    #[error("Invalid color: {0:?} (expected #RRGGBB)")]
    InvalidColor(String),

    /// Default categories are permanent
    #[error("Default category cannot be removed: {0}")]
    DefaultCategory(String),

    /// Selection covers no characters of the document
    #[error("Selection is empty or outside the document ({start}..{end} of {len})")]
    EmptySelection { start: usize, end: usize, len: usize },

    /// Highlight id not present in the store
    #[error("Highlight not found: {0}")]
    HighlightNotFound(String),
}

/// Result type alias for annotation operations
pub type Result<T> = std::result::Result<T, AnnotationError>;
