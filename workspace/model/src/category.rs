use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::CategoryId;

/// Represents a category for transactions.
/// Categories are hierarchical (e.g., "Food" -> "Groceries") through the optional
/// `parent` reference; the remote store does not guarantee that the reference resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "uuid")]
    pub id: CategoryId,
    pub title: String,
    /// A description of what the category is for.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    /// Self-reference to the parent category, `None` for a root.
    #[serde(default)]
    pub parent: Option<CategoryId>,
}

impl Category {
    /// Creates a root category without description.
    pub fn new(id: CategoryId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            parent: None,
        }
    }

    /// Returns the same category placed under `parent`.
    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Returns the same category with a description attached.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks whether the category claims to have no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// The store sends blank optional text as `""`; treat it as absent.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
