//! Annotation module
//!
//! Highlights over a flat contract text, the categories they are tagged
//! with, and the in-memory store that owns them.
//!
//! # Features
//!
//! - Character-offset anchoring into the document string
//! - Built-in categories (risk, obligation, key term, custom) plus
//!   user-defined ones
//! - Color snapshot per highlight, independent of later category edits
//! - Best-effort persistence through [`crate::storage::Persister`]

mod categories;
mod error;
mod store;
mod types;

pub use categories::{
    default_categories, is_default_category, slugify, CategoryRegistry, DEFAULT_ACTIVE_CATEGORY,
};
pub use error::{AnnotationError, Result};
pub use store::{HighlightQuery, HighlightStore, QueryOrder};
pub use types::{is_hex_color, Highlight, HighlightCategory, HighlightPatch, SelectionPayload};
