//! `TxTracker` — the mutable state behind the dispatcher.
//!
//! Owns the [`AssertionStore`] and [`TransactionIndex`] and applies one
//! finalized assertion at a time. All validation happens before the first
//! mutation, so a rejected assertion leaves the tracker untouched.

use std::sync::Arc;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::assertion::FinalizedAssertion;
use crate::chain::HashChainBuilder;
use crate::decoder::OutcomeDecoder;
use crate::error::TrackerError;
use crate::filter::{find_logs, LogQuery};
use crate::hashing::HashScheme;
use crate::index::TransactionIndex;
use crate::store::AssertionStore;
use crate::types::{AssertionRecord, LogEntry, TransactionRecord};

/// Size snapshot of the tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub assertions: usize,
    pub transactions: usize,
    pub bundles: usize,
    pub evm_logs: usize,
}

/// Assertion history plus transaction index.
pub struct TxTracker {
    instance_id: B256,
    chain: HashChainBuilder,
    decoder: Arc<dyn OutcomeDecoder>,
    store: AssertionStore,
    index: TransactionIndex,
}

impl TxTracker {
    pub fn new(
        instance_id: B256,
        scheme: Arc<dyn HashScheme>,
        decoder: Arc<dyn OutcomeDecoder>,
    ) -> Self {
        Self {
            instance_id,
            chain: HashChainBuilder::new(scheme),
            decoder,
            store: AssertionStore::new(),
            index: TransactionIndex::new(),
        }
    }

    /// Ingest one finalized assertion and return its height.
    ///
    /// Fails only on protocol-consistency violations; those are fatal and the
    /// caller must stop feeding assertions.
    pub fn ingest(&mut self, assertion: &FinalizedAssertion) -> Result<u64, TrackerError> {
        let sequence = assertion.sequence_num();
        if assertion.assertion != assertion.proposal.assertion {
            return Err(TrackerError::DigestMismatch { sequence });
        }
        let new_logs = assertion.new_logs().ok_or(TrackerError::NewLogCountOutOfRange {
            sequence,
            new: assertion.new_log_count,
            total: assertion.assertion.logs.len(),
        })?;

        let partial_hash = self
            .chain
            .scheme()
            .partial_hash(self.instance_id, &assertion.proposal);
        let chain = self.chain.build(&assertion.assertion.logs);
        let post_hash = chain.post_hash();
        let height = self.store.len() as u64;
        let first_new = chain.len() - new_logs.len();

        let mut tx_logs = Vec::new();
        for (i, raw) in new_logs.iter().enumerate() {
            let window = chain.window(new_logs.len(), i);

            let id = match self.decoder.decode(raw) {
                Ok(outcome) => {
                    let id = outcome.message().id;
                    tracing::debug!(height, tx = %id, kind = outcome.kind(), "Transaction outcome");
                    if let Some(bundle) = outcome.into_bundle() {
                        tx_logs.push(bundle);
                    }
                    id
                }
                Err(e) => {
                    // Keyed by the value hash so the record stays reachable.
                    let id = chain.value_hashes[first_new + i];
                    tracing::warn!(height, position = i, tx = %id, error = %e, "VM produced invalid outcome");
                    id
                }
            };

            let record = TransactionRecord {
                found: true,
                assertion_index: height,
                raw_value: raw.clone(),
                logs_pre_hash: window.pre_hash,
                logs_post_hash: post_hash,
                logs_val_hashes: window.value_hashes,
                validator_sigs: assertion.signatures.clone(),
                partial_hash,
                on_chain_tx_hash: assertion.on_chain_tx_hash,
            };
            if let Some(previous) = self.index.insert(id, record) {
                tracing::warn!(
                    tx = %id,
                    previous_height = previous.assertion_index,
                    height,
                    "Duplicate transaction id, replacing earlier record"
                );
            }
        }

        let tx_count = new_logs.len();
        let bundles = tx_logs.len();
        self.store.push(AssertionRecord {
            tx_logs,
            cumulative_hashes: chain.cumulative,
            value_hashes: chain.value_hashes,
        });

        tracing::info!(
            height,
            sequence,
            logs = assertion.assertion.logs.len(),
            new_logs = tx_count,
            bundles,
            post_hash = %post_hash,
            "Ingested finalized assertion"
        );
        Ok(height)
    }

    /// Height of the latest assertion, `-1` when none.
    pub fn assertion_count(&self) -> i64 {
        self.store.latest_height()
    }

    pub fn transaction(&self, id: &B256) -> TransactionRecord {
        self.index.lookup(id)
    }

    pub fn find_logs(&self, query: &LogQuery) -> Vec<LogEntry> {
        find_logs(&self.store, query)
    }

    pub fn store(&self) -> &AssertionStore {
        &self.store
    }

    pub fn index(&self) -> &TransactionIndex {
        &self.index
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            assertions: self.store.len(),
            transactions: self.index.len(),
            bundles: self.store.iter().map(|r| r.tx_logs.len()).sum(),
            evm_logs: self.store.iter().map(|r| r.evm_log_count()).sum(),
        }
    }
}

impl std::fmt::Debug for TxTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxTracker")
            .field("instance_id", &self.instance_id)
            .field("assertions", &self.store.len())
            .field("transactions", &self.index.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};

    use crate::assertion::{ExecutionDigest, LogValue, ProposalResults};
    use crate::decoder::{JsonOutcomeDecoder, Outcome};
    use crate::hashing::{fold_chain, KeccakScheme};
    use crate::types::{EvmLog, EvmMessage};

    fn tracker() -> TxTracker {
        TxTracker::new(B256::repeat_byte(0x77), Arc::new(KeccakScheme), Arc::new(JsonOutcomeDecoder))
    }

    fn message(id: u8) -> EvmMessage {
        EvmMessage {
            id: B256::repeat_byte(id),
            sender: Address::repeat_byte(1),
            destination: Address::repeat_byte(2),
            data: Bytes::new(),
        }
    }

    fn stop(id: u8, n_logs: u8) -> LogValue {
        let logs = (0..n_logs)
            .map(|i| EvmLog {
                address: Address::repeat_byte(0xa0 + i),
                topics: vec![B256::repeat_byte(i)],
                data: Bytes::from(vec![id, i]),
            })
            .collect();
        JsonOutcomeDecoder::encode(&Outcome::Stop { message: message(id), logs })
    }

    fn revert(id: u8) -> LogValue {
        JsonOutcomeDecoder::encode(&Outcome::Revert { message: message(id), output: Bytes::new() })
    }

    fn finalized(seq: u64, logs: Vec<LogValue>, new: usize) -> FinalizedAssertion {
        let digest = ExecutionDigest { logs, ..Default::default() };
        FinalizedAssertion {
            assertion: digest.clone(),
            proposal: ProposalResults { sequence_num: seq, assertion: digest, ..Default::default() },
            new_log_count: new,
            signatures: vec![Bytes::from_static(&[0x51, 0x9])],
            on_chain_tx_hash: B256::repeat_byte(0xcc),
        }
    }

    #[test]
    fn ingest_builds_records_and_chain() {
        let mut t = tracker();
        let a = finalized(0, vec![stop(1, 2), revert(2)], 2);
        assert_eq!(t.ingest(&a).unwrap(), 0);
        assert_eq!(t.assertion_count(), 0);

        let record = t.store().get(0).unwrap();
        assert_eq!(record.tx_logs.len(), 1, "revert adds no bundle");
        assert_eq!(record.cumulative_hashes.len(), 2);

        let s = KeccakScheme;
        let tx1 = t.transaction(&B256::repeat_byte(1));
        let tx2 = t.transaction(&B256::repeat_byte(2));
        assert!(tx1.found && tx2.found);
        assert_eq!(tx1.logs_pre_hash, B256::ZERO);
        assert_eq!(tx1.logs_post_hash, record.cumulative_hashes[1]);
        assert_eq!(tx2.logs_post_hash, record.cumulative_hashes[1]);
        assert_eq!(tx1.logs_val_hashes, record.value_hashes);
        assert_eq!(tx2.logs_val_hashes, record.value_hashes);
        assert_eq!(tx1.logs_val_hashes[0], s.value_hash(&a.assertion.logs[0]));
        assert_eq!(tx1.partial_hash, s.partial_hash(B256::repeat_byte(0x77), &a.proposal));
        assert_eq!(tx1.on_chain_tx_hash, B256::repeat_byte(0xcc));
        assert_eq!(tx1.validator_sigs, a.signatures);
        assert_eq!(tx1.raw_value, a.assertion.logs[0]);
    }

    #[test]
    fn only_new_suffix_creates_records() {
        let mut t = tracker();
        let a = finalized(0, vec![stop(1, 1), stop(2, 1), stop(3, 1)], 1);
        t.ingest(&a).unwrap();
        assert!(!t.transaction(&B256::repeat_byte(1)).found);
        assert!(!t.transaction(&B256::repeat_byte(2)).found);

        let tx3 = t.transaction(&B256::repeat_byte(3));
        let record = t.store().get(0).unwrap();
        // M = 3, N = 1, i = 0 → phi = 1
        assert_eq!(tx3.logs_pre_hash, record.cumulative_hashes[1]);
        assert_eq!(tx3.logs_val_hashes, vec![record.value_hashes[2]]);
        assert_eq!(
            fold_chain(&KeccakScheme, tx3.logs_pre_hash, &tx3.logs_val_hashes),
            tx3.logs_post_hash
        );
    }

    #[test]
    fn every_record_verifies_against_post_hash() {
        let mut t = tracker();
        // Two pending outcomes, then three new ones.
        let logs = vec![stop(1, 1), stop(2, 1), stop(3, 2), revert(4), stop(5, 1)];
        t.ingest(&finalized(0, logs, 3)).unwrap();

        let record = t.store().get(0).unwrap();
        for (id, expected_len) in [(3u8, 3usize), (4, 4), (5, 5)] {
            let tx = t.transaction(&B256::repeat_byte(id));
            assert!(tx.found);
            assert_eq!(tx.logs_val_hashes.len(), expected_len);
            assert_eq!(tx.logs_post_hash, record.logs_post_hash());
            assert_eq!(
                fold_chain(&KeccakScheme, tx.logs_pre_hash, &tx.logs_val_hashes),
                tx.logs_post_hash,
                "tx {id:#x}"
            );
        }
        // The last new transaction's window starts at the zero hash and spans the assertion.
        let last = t.transaction(&B256::repeat_byte(5));
        assert_eq!(last.logs_pre_hash, B256::ZERO);
        assert_eq!(last.logs_val_hashes, record.value_hashes);
    }

    #[test]
    fn digest_mismatch_is_fatal_and_leaves_state_untouched() {
        let mut t = tracker();
        let mut a = finalized(5, vec![stop(1, 1)], 1);
        a.proposal.assertion.num_steps = 99;
        let err = t.ingest(&a).unwrap_err();
        assert!(matches!(err, TrackerError::DigestMismatch { sequence: 5 }));
        assert!(err.is_fatal());
        assert_eq!(t.assertion_count(), -1);
        assert!(t.index().is_empty());
    }

    #[test]
    fn new_log_count_out_of_range() {
        let mut t = tracker();
        let err = t.ingest(&finalized(0, vec![stop(1, 1)], 2)).unwrap_err();
        assert!(matches!(err, TrackerError::NewLogCountOutOfRange { new: 2, total: 1, .. }));
        assert!(t.store().is_empty());
    }

    #[test]
    fn decode_failure_still_creates_record() {
        let mut t = tracker();
        let garbage = LogValue::new(b"not an outcome".to_vec());
        t.ingest(&finalized(0, vec![garbage.clone(), stop(4, 1)], 2)).unwrap();

        let fallback_id = KeccakScheme.value_hash(&garbage);
        let rec = t.transaction(&fallback_id);
        assert!(rec.found);
        assert_eq!(rec.raw_value, garbage);
        assert!(t.transaction(&B256::repeat_byte(4)).found, "later tx still processed");
        assert_eq!(t.store().get(0).unwrap().tx_logs.len(), 1);
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let mut t = tracker();
        t.ingest(&finalized(0, vec![stop(9, 1)], 1)).unwrap();
        t.ingest(&finalized(1, vec![revert(9)], 1)).unwrap();
        let rec = t.transaction(&B256::repeat_byte(9));
        assert_eq!(rec.assertion_index, 1);
        assert_eq!(t.index().len(), 1);
    }

    #[test]
    fn empty_assertion() {
        let mut t = tracker();
        t.ingest(&finalized(0, vec![], 0)).unwrap();
        assert_eq!(t.assertion_count(), 0);
        assert_eq!(t.store().get(0).unwrap().logs_post_hash(), B256::ZERO);
    }

    #[test]
    fn stats_and_queries() {
        let mut t = tracker();
        t.ingest(&finalized(0, vec![stop(1, 2)], 1)).unwrap();
        t.ingest(&finalized(1, vec![stop(2, 3), revert(3)], 2)).unwrap();

        let stats = t.stats();
        assert_eq!(stats, TrackerStats { assertions: 2, transactions: 3, bundles: 2, evm_logs: 5 });

        let logs = t.find_logs(&LogQuery::new().from_height(1));
        assert_eq!(logs.len(), 3);
        assert!(logs.iter().all(|l| l.block_number == 1 && l.transaction_hash == B256::repeat_byte(2)));
    }
}
