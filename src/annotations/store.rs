//! In-memory highlight store
//!
//! The store is the single source of truth for a session's highlights.
//! Every mutation completes in memory first and then queues a snapshot of
//! the whole collection for storage; storage failures never reach callers.

use serde::Deserialize;

use super::categories::CategoryRegistry;
use super::error::{AnnotationError, Result};
use super::types::{Highlight, HighlightPatch, SelectionPayload};
use crate::storage::{load_json, KeyValueStore, Persister};
use crate::text::{char_len, char_slice};

/// Ordering for query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOrder {
    /// Insertion order
    #[default]
    Created,
    /// Ascending start offset, then ascending end offset
    Position,
    /// Newest first
    Newest,
}

/// Query filters for listing highlights
#[derive(Debug, Default, Clone)]
pub struct HighlightQuery {
    pub category: Option<String>,
    /// Case-insensitive match against text or note
    pub text: Option<String>,
    pub order: QueryOrder,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl HighlightQuery {
    pub fn by_category(category: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    pub fn by_position() -> Self {
        Self {
            order: QueryOrder::Position,
            ..Default::default()
        }
    }

    fn matches(&self, highlight: &Highlight) -> bool {
        if let Some(ref category) = self.category {
            if highlight.category != *category {
                return false;
            }
        }
        if let Some(ref text) = self.text {
            let needle = text.to_lowercase();
            let in_text = highlight.text.to_lowercase().contains(&needle);
            let in_note = highlight
                .note
                .as_ref()
                .map(|n| n.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_text && !in_note {
                return false;
            }
        }
        true
    }
}

/// Authoritative highlight collection for one document
#[derive(Debug)]
pub struct HighlightStore {
    highlights: Vec<Highlight>,
    selected: Option<String>,
    key: String,
    persister: Persister,
}

impl HighlightStore {
    /// Empty store
    pub fn new(key: &str, persister: Persister) -> Self {
        Self {
            highlights: Vec::new(),
            selected: None,
            key: key.to_string(),
            persister,
        }
    }

    /// Store restored from `store`; starts empty if nothing usable is stored
    pub async fn load(store: &dyn KeyValueStore, key: &str, persister: Persister) -> Self {
        let highlights: Vec<Highlight> = load_json(store, key).await.unwrap_or_default();
        tracing::debug!(key = %key, count = highlights.len(), "Loaded highlights");

        Self {
            highlights,
            selected: None,
            key: key.to_string(),
            persister,
        }
    }

    /// Accept a selection and record it as a highlight
    ///
    /// The range is clamped to the document; whatever survives must cover at
    /// least one character. The stored text is always the document slice for
    /// the accepted range.
    pub fn create(
        &mut self,
        payload: SelectionPayload,
        document: &str,
        categories: &CategoryRegistry,
    ) -> Result<Highlight> {
        let len = char_len(document);
        let start = payload.start_index.min(len);
        let end = payload.end_index.min(len);

        let text = match char_slice(document, start, end) {
            Some(text) if start < end => text.to_string(),
            _ => {
                return Err(AnnotationError::EmptySelection {
                    start: payload.start_index,
                    end: payload.end_index,
                    len,
                })
            }
        };

        if text != payload.text {
            tracing::debug!(
                start = start,
                end = end,
                "Selection text differs from document slice, keeping document text"
            );
        }

        let accepted = SelectionPayload {
            text,
            start_index: start,
            end_index: end,
        };
        let highlight = Highlight::new(accepted, categories.active());
        self.highlights.push(highlight.clone());

        tracing::info!(
            id = %highlight.id,
            category = %highlight.category,
            start = highlight.start_index,
            end = highlight.end_index,
            "Highlight created"
        );

        self.persist();
        Ok(highlight)
    }

    /// Merge `patch` into the highlight with `id`
    ///
    /// Returns `None` (and changes nothing) if the id is unknown.
    pub fn update(&mut self, id: &str, patch: &HighlightPatch) -> Option<&Highlight> {
        let index = self.highlights.iter().position(|h| h.id == id)?;
        self.highlights[index].apply(patch);
        self.persist();

        tracing::debug!(id = %id, "Highlight updated");
        Some(&self.highlights[index])
    }

    /// Delete the highlight with `id`
    pub fn remove(&mut self, id: &str) -> Option<Highlight> {
        let index = self.highlights.iter().position(|h| h.id == id)?;
        let removed = self.highlights.remove(index);

        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.persist();

        tracing::info!(id = %id, "Highlight removed");
        Some(removed)
    }

    /// Delete every highlight, returning how many were removed
    ///
    /// The stored key is deleted rather than overwritten with an empty list.
    pub fn clear(&mut self) -> usize {
        let count = self.highlights.len();
        self.highlights.clear();
        self.selected = None;
        self.persister.remove(&self.key);

        tracing::info!(count = count, "Highlights cleared");
        count
    }

    pub fn get(&self, id: &str) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    /// All highlights in insertion order
    pub fn all(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    /// Highlights matching an arbitrary predicate, in insertion order
    pub fn filter<F>(&self, predicate: F) -> Vec<&Highlight>
    where
        F: Fn(&Highlight) -> bool,
    {
        self.highlights.iter().filter(|h| predicate(h)).collect()
    }

    /// List highlights with filters, ordering and paging
    pub fn query(&self, query: &HighlightQuery) -> Vec<&Highlight> {
        let mut results = self.filter(|h| query.matches(h));

        match query.order {
            QueryOrder::Created => {}
            QueryOrder::Position => {
                results.sort_by_key(|h| (h.start_index, h.end_index));
            }
            QueryOrder::Newest => results.reverse(),
        }

        results
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Mark a highlight as selected for editing
    pub fn select(&mut self, id: &str) -> Result<&Highlight> {
        let index = self
            .highlights
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| AnnotationError::HighlightNotFound(id.to_string()))?;
        self.selected = Some(id.to_string());
        Ok(&self.highlights[index])
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// The highlight currently selected for editing
    pub fn selected(&self) -> Option<&Highlight> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Queue a snapshot of the collection for storage
    pub fn persist(&self) {
        self.persister.save(&self.key, &self.highlights);
    }
}
