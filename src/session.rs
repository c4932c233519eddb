//! Review session
//!
//! One contract document together with its category registry and highlight
//! store. A session drives the whole cycle: a selection comes in, the store
//! records it, the persister queues a snapshot and the render engine paints
//! the result.

use crate::annotations::{
    is_hex_color, AnnotationError, CategoryRegistry, Highlight, HighlightPatch, HighlightQuery,
    HighlightStore, Result, SelectionPayload,
};
use crate::export::{export_csv, CsvExport, ExportError};
use crate::html::{render_with, OverlapStrategy, RenderOptions, RenderOutput};
use crate::selection::{map_selection, SelectionSource};
use crate::storage::{KeyValueStore, Persister, StorageKeys};
use crate::text::char_len;

/// A document under review
#[derive(Debug)]
pub struct ReviewSession {
    document_id: String,
    document: String,
    categories: CategoryRegistry,
    highlights: HighlightStore,
    options: RenderOptions,
}

impl ReviewSession {
    /// Open a session, restoring any persisted categories and highlights
    pub async fn open(
        document_id: &str,
        document: String,
        backend: &dyn KeyValueStore,
        persister: Persister,
        options: RenderOptions,
    ) -> Self {
        let keys = StorageKeys::for_document(document_id);
        let categories = CategoryRegistry::load(backend, &keys.categories, persister.clone()).await;
        let highlights = HighlightStore::load(backend, &keys.highlights, persister).await;

        tracing::info!(
            document = %document_id,
            chars = char_len(&document),
            highlights = highlights.len(),
            categories = categories.list().len(),
            "Review session opened"
        );

        Self {
            document_id: document_id.to_string(),
            document,
            categories,
            highlights,
            options,
        }
    }

    /// A session that keeps everything in memory only
    pub fn detached(document_id: &str, document: String) -> Self {
        let keys = StorageKeys::for_document(document_id);
        Self {
            document_id: document_id.to_string(),
            document,
            categories: CategoryRegistry::new(&keys.categories, Persister::disabled()),
            highlights: HighlightStore::new(&keys.highlights, Persister::disabled()),
            options: RenderOptions::default(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryRegistry {
        &mut self.categories
    }

    pub fn highlights(&self) -> &HighlightStore {
        &self.highlights
    }

    pub fn render_options(&self) -> &RenderOptions {
        &self.options
    }

    /// Swap in a new revision of the document
    ///
    /// Stored offsets are kept as they are; the anchor policy decides how
    /// stale highlights render.
    pub fn replace_document(&mut self, document: String) {
        if document != self.document {
            tracing::info!(
                document = %self.document_id,
                old_chars = char_len(&self.document),
                new_chars = char_len(&document),
                "Document text replaced"
            );
            self.document = document;
        }
    }

    /// Record a highlight for whatever `source` has selected
    ///
    /// `Ok(None)` when there is no usable selection.
    pub fn highlight_selection<S>(&mut self, source: &S) -> Result<Option<Highlight>>
    where
        S: SelectionSource + ?Sized,
    {
        match map_selection(source) {
            Some(payload) => self.create(payload).map(Some),
            None => Ok(None),
        }
    }

    /// Record a highlight for an already-mapped selection
    pub fn create(&mut self, payload: SelectionPayload) -> Result<Highlight> {
        self.highlights
            .create(payload, &self.document, &self.categories)
    }

    /// Edit a highlight's note, category or color
    ///
    /// Moving a highlight to another category takes that category's current
    /// color unless the patch names one explicitly.
    pub fn update(&mut self, id: &str, patch: HighlightPatch) -> Result<&Highlight> {
        let mut patch = patch;

        if let Some(ref color) = patch.color {
            if !is_hex_color(color) {
                return Err(AnnotationError::InvalidColor(color.clone()));
            }
        }
        if let Some(ref category) = patch.category {
            let category = self
                .categories
                .get(category)
                .ok_or_else(|| AnnotationError::UnknownCategory(category.clone()))?;
            if patch.color.is_none() {
                patch.color = Some(category.color.clone());
            }
        }

        self.highlights
            .update(id, &patch)
            .ok_or_else(|| AnnotationError::HighlightNotFound(id.to_string()))
    }

    pub fn remove(&mut self, id: &str) -> Result<Highlight> {
        self.highlights
            .remove(id)
            .ok_or_else(|| AnnotationError::HighlightNotFound(id.to_string()))
    }

    pub fn clear(&mut self) -> usize {
        self.highlights.clear()
    }

    pub fn select(&mut self, id: &str) -> Result<&Highlight> {
        self.highlights.select(id)
    }

    pub fn deselect(&mut self) {
        self.highlights.deselect();
    }

    pub fn query(&self, query: &HighlightQuery) -> Vec<&Highlight> {
        self.highlights.query(query)
    }

    /// Render with the session's options
    pub fn render(&self) -> RenderOutput {
        render_with(
            &self.document,
            self.highlights.all(),
            self.categories.list(),
            &self.options,
        )
    }

    /// Render with a one-off overlap strategy
    pub fn render_as(&self, overlap: OverlapStrategy) -> RenderOutput {
        let options = RenderOptions {
            overlap,
            ..self.options.clone()
        };
        render_with(
            &self.document,
            self.highlights.all(),
            self.categories.list(),
            &options,
        )
    }

    pub fn export_csv(&self) -> std::result::Result<CsvExport, ExportError> {
        export_csv(self.highlights.all())
    }
}
