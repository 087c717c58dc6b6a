//! Model catalog collaborator
//!
//! An optional list of currently valid model identifiers. Only used for
//! advisory validation of a pool's model allow-list: the catalog may be stale,
//! so unknown models are warnings by default, never hard failures.

use std::collections::HashSet;

/// A catalog of known model identifiers.
pub trait ModelCatalog: Send + Sync {
    /// Whether the catalog knows this model id.
    fn contains(&self, model_id: &str) -> bool;
}

/// A fixed, in-memory model catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticModelCatalog {
    models: HashSet<String>,
}

impl StaticModelCatalog {
    pub fn new(models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelCatalog for StaticModelCatalog {
    fn contains(&self, model_id: &str) -> bool {
        self.models.contains(model_id)
    }
}
