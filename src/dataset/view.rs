use std::sync::Arc;

use super::{Dataset, PhotoRecord};

/// A selection of rows over a shared dataset.
///
/// Filtering and sampling produce new views; the underlying records are
/// never copied or mutated.
#[derive(Debug, Clone)]
pub struct RecordView {
    dataset: Arc<Dataset>,
    rows: Vec<usize>,
}

impl RecordView {
    /// A view over every record of the dataset.
    pub fn full(dataset: Arc<Dataset>) -> Self {
        let rows = (0..dataset.len()).collect();
        Self { dataset, rows }
    }

    /// A view over the given row indices. Out-of-range indices are dropped.
    pub fn from_rows(dataset: Arc<Dataset>, rows: Vec<usize>) -> Self {
        let len = dataset.len();
        let rows = rows.into_iter().filter(|&r| r < len).collect();
        Self { dataset, rows }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Row indices into the dataset, in view order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PhotoRecord> {
        self.rows
            .get(index)
            .and_then(|&row| self.dataset.records.get(row))
    }

    pub fn records(&self) -> impl Iterator<Item = &PhotoRecord> + '_ {
        self.rows.iter().map(move |&row| &self.dataset.records[row])
    }

    /// Keep only the rows whose record satisfies `predicate`.
    pub fn retain<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&PhotoRecord) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .copied()
            .filter(|&row| predicate(&self.dataset.records[row]))
            .collect();
        Self {
            dataset: Arc::clone(&self.dataset),
            rows,
        }
    }
}
