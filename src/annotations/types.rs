//! Highlight and category types
//!
//! The serialized shapes are the interchange format shared with the web
//! client, so field names stay camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single tagged span of the contract text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Unique identifier (UUID)
    pub id: String,
    /// The text captured when the highlight was created
    pub text: String,
    /// Start character offset (inclusive)
    #[serde(rename = "startIndex")]
    pub start_index: usize,
    /// End character offset (exclusive)
    #[serde(rename = "endIndex")]
    pub end_index: usize,
    /// Background color, snapshotted from the category at creation
    pub color: String,
    /// Category id
    pub category: String,
    /// Free-text note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Creation timestamp
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Highlight {
    /// Create a new highlight for an accepted selection
    pub fn new(payload: SelectionPayload, category: &HighlightCategory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: payload.text,
            start_index: payload.start_index,
            end_index: payload.end_index,
            color: category.color.clone(),
            category: category.id.clone(),
            note: None,
            created_at: Utc::now(),
        }
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two highlights share at least one character
    pub fn overlaps(&self, other: &Highlight) -> bool {
        self.start_index < other.end_index && other.start_index < self.end_index
    }

    /// Apply a shallow patch
    pub fn apply(&mut self, patch: &HighlightPatch) {
        if let Some(ref note) = patch.note {
            let note = note.trim();
            self.note = if note.is_empty() {
                None
            } else {
                Some(note.to_string())
            };
        }
        if let Some(ref category) = patch.category {
            self.category = category.clone();
        }
        if let Some(ref color) = patch.color {
            self.color = color.clone();
        }
    }
}

/// Candidate highlight produced by the selection mapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPayload {
    pub text: String,
    #[serde(rename = "startIndex")]
    pub start_index: usize,
    #[serde(rename = "endIndex")]
    pub end_index: usize,
}

/// Partial update for a highlight
///
/// An empty note clears the existing one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HighlightPatch {
    pub note: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
}

impl HighlightPatch {
    pub fn note(note: &str) -> Self {
        Self {
            note: Some(note.to_string()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.note.is_none() && self.category.is_none() && self.color.is_none()
    }
}

/// A named, colored classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightCategory {
    /// Stable slug
    pub id: String,
    /// Display name
    pub name: String,
    /// Hex color (`#RRGGBB`)
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl HighlightCategory {
    pub fn new(id: &str, name: &str, color: &str, description: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            description: description.map(|d| d.to_string()),
        }
    }
}

/// Check for a `#RRGGBB` color value
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}
