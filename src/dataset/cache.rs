use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{load_dataset, Dataset, LoadError};

/// Process-lifetime memo of loaded datasets, keyed by normalized path.
///
/// Entries are never invalidated: a changed file at the same path is only
/// picked up after a restart. Failed loads are not cached.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<String, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a user-supplied path.
    pub fn normalize_key(path: &str) -> String {
        path.trim().to_string()
    }

    /// Return the cached dataset for `path`, loading it on first access.
    pub fn get_or_load(&mut self, path: &str) -> Result<Arc<Dataset>, LoadError> {
        let key = Self::normalize_key(path);

        if let Some(dataset) = self.entries.get(&key) {
            tracing::debug!(path = %key, "Dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load_dataset(Path::new(&key))?);
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&Self::normalize_key(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
