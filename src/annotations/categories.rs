//! Category registry
//!
//! Holds the categories a highlight can be tagged with and tracks which one
//! new highlights inherit. The active color is looked up on every call, so
//! recoloring a category affects new highlights immediately while existing
//! highlights keep the color they were created with.

use super::error::{AnnotationError, Result};
use super::types::{is_hex_color, HighlightCategory};
use crate::storage::{load_json, KeyValueStore, Persister};

/// Category active when a registry is created
pub const DEFAULT_ACTIVE_CATEGORY: &str = "risk";

/// The four built-in categories, in display order
pub fn default_categories() -> Vec<HighlightCategory> {
    vec![
        HighlightCategory::new(
            "risk",
            "Risk",
            "#F44336",
            Some("Clauses that expose a party to liability or loss"),
        ),
        HighlightCategory::new(
            "obligation",
            "Obligation",
            "#2196F3",
            Some("Duties a party must perform"),
        ),
        HighlightCategory::new(
            "key-term",
            "Key Term",
            "#4CAF50",
            Some("Defined terms, amounts, dates and durations"),
        ),
        HighlightCategory::new("custom", "Custom", "#FFEB3B", Some("Anything else worth marking")),
    ]
}

/// Whether `id` names one of the built-in categories
pub fn is_default_category(id: &str) -> bool {
    matches!(id, "risk" | "obligation" | "key-term" | "custom")
}

/// Turn a display name into a category id: lowercase, whitespace runs to `-`
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Registry of highlight categories for one review session
#[derive(Debug)]
pub struct CategoryRegistry {
    categories: Vec<HighlightCategory>,
    active: String,
    key: String,
    persister: Persister,
}

impl CategoryRegistry {
    /// Registry seeded with the defaults
    pub fn new(key: &str, persister: Persister) -> Self {
        Self::from_categories(default_categories(), key, persister)
    }

    /// Registry restored from `store`, or seeded with the defaults
    pub async fn load(store: &dyn KeyValueStore, key: &str, persister: Persister) -> Self {
        match load_json::<Vec<HighlightCategory>>(store, key).await {
            Some(categories) => {
                tracing::debug!(key = %key, count = categories.len(), "Loaded categories");
                Self::from_categories(categories, key, persister)
            }
            None => {
                tracing::debug!(key = %key, "No stored categories, seeding defaults");
                let registry = Self::new(key, persister);
                registry.persist();
                registry
            }
        }
    }

    fn from_categories(stored: Vec<HighlightCategory>, key: &str, persister: Persister) -> Self {
        let mut categories: Vec<HighlightCategory> = Vec::with_capacity(stored.len() + 4);
        for category in stored {
            if categories.iter().any(|c| c.id == category.id) {
                tracing::warn!(id = %category.id, "Dropping duplicate category id");
                continue;
            }
            categories.push(category);
        }

        // A stored set may predate a default; put it back in its usual slot
        for (position, default) in default_categories().into_iter().enumerate() {
            if !categories.iter().any(|c| c.id == default.id) {
                categories.insert(position.min(categories.len()), default);
            }
        }

        Self {
            categories,
            active: DEFAULT_ACTIVE_CATEGORY.to_string(),
            key: key.to_string(),
            persister,
        }
    }

    /// All categories in insertion order, defaults first
    pub fn list(&self) -> &[HighlightCategory] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&HighlightCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The category new highlights are tagged with
    pub fn active(&self) -> &HighlightCategory {
        self.get(&self.active).unwrap_or(&self.categories[0])
    }

    pub fn active_id(&self) -> &str {
        &self.active().id
    }

    /// Current color of the active category
    pub fn active_color(&self) -> &str {
        &self.active().color
    }

    /// Change the category subsequent highlights inherit
    pub fn set_active(&mut self, id: &str) -> Result<&HighlightCategory> {
        if !self.contains(id) {
            return Err(AnnotationError::UnknownCategory(id.to_string()));
        }
        self.active = id.to_string();
        tracing::debug!(id = %id, "Active category changed");
        Ok(self.active())
    }

    /// Append a user-defined category
    ///
    /// The id is the slug of `name`; a slug already in use gets a numeric
    /// suffix (`liability`, `liability-2`, ...).
    pub fn add(
        &mut self,
        name: &str,
        color: &str,
        description: Option<&str>,
    ) -> Result<HighlightCategory> {
        let name = name.trim();
        let base = slugify(name);
        if base.is_empty() {
            return Err(AnnotationError::InvalidCategoryName(name.to_string()));
        }
        if !is_hex_color(color) {
            return Err(AnnotationError::InvalidColor(color.to_string()));
        }

        let mut id = base.clone();
        let mut suffix = 2;
        while self.contains(&id) {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        let description = description.map(str::trim).filter(|d| !d.is_empty());
        let category = HighlightCategory::new(&id, name, color, description);
        self.categories.push(category.clone());
        self.persist();

        tracing::info!(id = %category.id, name = %category.name, "Category added");
        Ok(category)
    }

    /// Recolor a category; existing highlights keep their stored color
    pub fn set_color(&mut self, id: &str, color: &str) -> Result<&HighlightCategory> {
        if !is_hex_color(color) {
            return Err(AnnotationError::InvalidColor(color.to_string()));
        }
        let index = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AnnotationError::UnknownCategory(id.to_string()))?;

        self.categories[index].color = color.to_string();
        self.persist();
        Ok(&self.categories[index])
    }

    /// Remove a user-defined category
    ///
    /// Highlights tagged with it are left untouched.
    pub fn remove(&mut self, id: &str) -> Result<HighlightCategory> {
        if is_default_category(id) {
            return Err(AnnotationError::DefaultCategory(id.to_string()));
        }
        let index = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AnnotationError::UnknownCategory(id.to_string()))?;

        let removed = self.categories.remove(index);
        if self.active == removed.id {
            self.active = DEFAULT_ACTIVE_CATEGORY.to_string();
        }
        self.persist();

        tracing::info!(id = %removed.id, "Category removed");
        Ok(removed)
    }

    /// Queue a snapshot of the registry for storage
    pub fn persist(&self) {
        self.persister.save(&self.key, &self.categories);
    }
}
