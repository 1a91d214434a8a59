//! Records held by the tracker and the query-facing log type.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::assertion::LogValue;

// ─── Decoded EVM data ─────────────────────────────────────────────────────────

/// A single EVM event log emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmLog {
    /// Contract that emitted the log.
    pub address: Address,
    /// Indexed topics; `topics[0]` is usually the event signature hash.
    pub topics: Vec<B256>,
    /// Non-indexed ABI-encoded payload.
    pub data: Bytes,
}

impl EvmLog {
    /// Returns `true` if `topics` is a positional prefix of this log's topics.
    pub fn matches_topics(&self, topics: &[B256]) -> bool {
        topics.len() <= self.topics.len() && topics.iter().zip(&self.topics).all(|(a, b)| a == b)
    }
}

/// The message a transaction outcome answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmMessage {
    /// Message identifier; doubles as the transaction hash exposed to queries.
    pub id: B256,
    pub sender: Address,
    pub destination: Address,
    pub data: Bytes,
}

// ─── Stored records ───────────────────────────────────────────────────────────

/// The decoded message of a Stop/Return outcome together with its logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLogBundle {
    pub message: EvmMessage,
    pub logs: Vec<EvmLog>,
}

/// Everything the tracker keeps about one ingested assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRecord {
    /// One bundle per Stop/Return outcome, in transaction order.
    pub tx_logs: Vec<TransactionLogBundle>,
    /// `cumulative[i] = H(cumulative[i-1], value_hashes[i])`, seeded with the zero hash.
    pub cumulative_hashes: Vec<B256>,
    pub value_hashes: Vec<B256>,
}

impl AssertionRecord {
    /// The last cumulative hash, or the zero hash when the assertion produced no logs.
    pub fn logs_post_hash(&self) -> B256 {
        self.cumulative_hashes.last().copied().unwrap_or(B256::ZERO)
    }

    /// Total number of decoded EVM logs across all bundles.
    pub fn evm_log_count(&self) -> usize {
        self.tx_logs.iter().map(|b| b.logs.len()).sum()
    }
}

/// The tracker's view of one transaction outcome.
///
/// Serialised with `0x`-prefixed hex hashes so an RPC layer can hand it out as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub found: bool,
    /// Height of the assertion that produced this outcome.
    pub assertion_index: u64,
    pub raw_value: LogValue,
    pub logs_pre_hash: B256,
    pub logs_post_hash: B256,
    /// Tail of the assertion's value hashes that folds `logs_pre_hash` into `logs_post_hash`.
    pub logs_val_hashes: Vec<B256>,
    pub validator_sigs: Vec<Bytes>,
    pub partial_hash: B256,
    pub on_chain_tx_hash: B256,
}

impl TransactionRecord {
    /// The negative answer to a lookup.
    pub fn not_found() -> Self {
        Self::default()
    }
}

// ─── Query results ────────────────────────────────────────────────────────────

/// A log as returned by a `FindLogs` query. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: Address,
    pub transaction_hash: B256,
    /// Assertion height, exposed as a block number.
    pub block_number: u64,
    pub data: Bytes,
    pub topics: Vec<B256>,
    /// Position of the log among all logs of its assertion, counted before
    /// filtering, so the same log keeps its index whatever query returned it.
    pub log_index: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(n: u8) -> B256 {
        B256::repeat_byte(n)
    }

    fn log_with(topics: Vec<B256>) -> EvmLog {
        EvmLog { address: Address::ZERO, topics, data: Bytes::new() }
    }

    #[test]
    fn topic_prefix_matching() {
        let (a, b, c, d, x) = (topic(1), topic(2), topic(3), topic(4), topic(9));
        let log = log_with(vec![a, b, c]);

        assert!(log.matches_topics(&[]));
        assert!(log.matches_topics(&[a]));
        assert!(log.matches_topics(&[a, b]));
        assert!(log.matches_topics(&[a, b, c]));
        assert!(!log.matches_topics(&[a, x]));
        assert!(!log.matches_topics(&[a, b, c, d]));
    }

    #[test]
    fn post_hash_of_empty_assertion_is_zero() {
        assert_eq!(AssertionRecord::default().logs_post_hash(), B256::ZERO);
    }

    #[test]
    fn not_found_record() {
        let r = TransactionRecord::not_found();
        assert!(!r.found);
        assert!(r.logs_val_hashes.is_empty());
    }

    #[test]
    fn record_serializes_hex_hashes() {
        let r = TransactionRecord {
            found: true,
            logs_pre_hash: topic(0xab),
            ..Default::default()
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["found"], true);
        assert_eq!(json["logsPreHash"].as_str().unwrap(), format!("0x{}", "ab".repeat(32)));
    }
}
