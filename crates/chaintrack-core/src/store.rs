//! Append-only assertion history.
//!
//! Records are pushed once, in height order, and never mutated or removed.
//! The store has no retention limit: it grows for the life of the process.

use crate::types::AssertionRecord;

/// Ordered sequence of ingested assertions; the index of a record is its height.
#[derive(Debug, Default)]
pub struct AssertionStore {
    records: Vec<AssertionRecord>,
}

impl AssertionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return its height.
    pub fn push(&mut self, record: AssertionRecord) -> u64 {
        self.records.push(record);
        (self.records.len() - 1) as u64
    }

    pub fn get(&self, height: u64) -> Option<&AssertionRecord> {
        self.records.get(usize::try_from(height).ok()?)
    }

    /// Number of stored assertions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Height of the latest assertion, `-1` when empty.
    pub fn latest_height(&self) -> i64 {
        self.records.len() as i64 - 1
    }

    /// Records in `[start, end)`, clamped to the stored range.
    pub fn range(&self, start: usize, end: usize) -> &[AssertionRecord] {
        let end = end.min(self.records.len());
        let start = start.min(end);
        &self.records[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.records.iter()
    }
}
