//! Log queries over the assertion store.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::store::AssertionStore;
use crate::types::LogEntry;

/// Parameters of a `FindLogs` query.
///
/// Heights are signed so callers can pass unchecked values; negative bounds
/// clamp to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    /// First height (inclusive). `None` = 0.
    pub from_height: Option<i64>,
    /// Last height (inclusive). `None` = latest.
    pub to_height: Option<i64>,
    /// Only logs emitted by this contract.
    pub address: Option<Address>,
    /// Positional topic prefix; empty matches every log.
    #[serde(default)]
    pub topics: Vec<B256>,
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_height(mut self, height: i64) -> Self {
        self.from_height = Some(height);
        self
    }

    pub fn to_height(mut self, height: i64) -> Self {
        self.to_height = Some(height);
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Append a topic to the positional prefix.
    pub fn topic(mut self, topic: B256) -> Self {
        self.topics.push(topic);
        self
    }

    /// Effective `[start, end)` height window against a store of `len` assertions.
    fn window(&self, len: usize) -> (usize, usize) {
        let len = len as i64;
        let start = self.from_height.unwrap_or(0).max(0);
        let end = match self.to_height {
            Some(to) => to.saturating_add(1).min(len),
            None => len,
        };
        (start as usize, end.max(0) as usize)
    }
}

/// Find every log in `store` matching `query`, ordered by height, then
/// transaction, then log. Log indexes count skipped logs too.
pub fn find_logs(store: &AssertionStore, query: &LogQuery) -> Vec<LogEntry> {
    let mut out = Vec::new();
    let (start, end) = query.window(store.len());
    if start >= store.len() || end <= start {
        return out;
    }

    for (offset, record) in store.range(start, end).iter().enumerate() {
        let height = (start + offset) as u64;
        let mut log_index = 0u64;
        for bundle in &record.tx_logs {
            for log in &bundle.logs {
                let position = log_index;
                log_index += 1;

                if query.address.is_some_and(|a| a != log.address) {
                    continue;
                }
                if !log.matches_topics(&query.topics) {
                    continue;
                }
                out.push(LogEntry {
                    address: log.address,
                    transaction_hash: bundle.message.id,
                    block_number: height,
                    data: log.data.clone(),
                    topics: log.topics.clone(),
                    log_index: position,
                });
            }
        }
    }
    out
}
