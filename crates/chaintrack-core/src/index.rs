//! Transaction lookup by message identifier.

use std::collections::HashMap;

use alloy_primitives::B256;

use crate::types::TransactionRecord;

/// Map from message identifier to the record built at ingestion.
#[derive(Debug, Default)]
pub struct TransactionIndex {
    records: HashMap<B256, TransactionRecord>,
}

impl TransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a record. Returns the record it replaced, if the id was already present.
    pub fn insert(&mut self, id: B256, record: TransactionRecord) -> Option<TransactionRecord> {
        self.records.insert(id, record)
    }

    pub fn get(&self, id: &B256) -> Option<&TransactionRecord> {
        self.records.get(id)
    }

    /// Owned answer for a query: the record, or a `found = false` placeholder.
    pub fn lookup(&self, id: &B256) -> TransactionRecord {
        self.records
            .get(id)
            .cloned()
            .unwrap_or_else(TransactionRecord::not_found)
    }

    pub fn contains(&self, id: &B256) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(height: u64) -> TransactionRecord {
        TransactionRecord { found: true, assertion_index: height, ..Default::default() }
    }

    #[test]
    fn lookup_hit_and_miss() {
        let mut index = TransactionIndex::new();
        let id = B256::repeat_byte(1);
        index.insert(id, rec(3));

        let hit = index.lookup(&id);
        assert!(hit.found);
        assert_eq!(hit.assertion_index, 3);

        let miss = index.lookup(&B256::repeat_byte(2));
        assert!(!miss.found);
    }

    #[test]
    fn duplicate_id_last_write_wins() {
        let mut index = TransactionIndex::new();
        let id = B256::repeat_byte(7);
        assert!(index.insert(id, rec(0)).is_none());
        let replaced = index.insert(id, rec(1)).unwrap();
        assert_eq!(replaced.assertion_index, 0);
        assert_eq!(index.lookup(&id).assertion_index, 1);
        assert_eq!(index.len(), 1);
    }
}
