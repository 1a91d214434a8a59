//! Finalized assertions as delivered by the validator feed.

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};

/// An opaque log value produced by the rollup VM: one transaction outcome.
///
/// Its content hash feeds the log hash chain; its meaning is recovered by an
/// [`OutcomeDecoder`](crate::decoder::OutcomeDecoder).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogValue(pub Bytes);

impl LogValue {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Inclusive block/time window a proposal is valid for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBounds {
    pub start: u64,
    pub end: u64,
}

/// The result of executing one batch: the digest validators sign over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDigest {
    /// VM state hash after execution.
    pub after_hash: B256,
    pub num_steps: u64,
    /// Hash of the outgoing messages emitted by the batch.
    pub out_msgs_hash: B256,
    /// Log values, in production order. The tail `new_log_count` of them are new.
    pub logs: Vec<LogValue>,
}

/// Parameters of the proposal round that produced an assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResults {
    pub sequence_num: u64,
    pub before_hash: B256,
    pub time_bounds: TimeBounds,
    pub new_inbox_hash: B256,
    pub original_inbox_hash: B256,
    /// The digest as it was originally proposed.
    pub assertion: ExecutionDigest,
}

/// A unanimously-signed assertion, ready for ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedAssertion {
    pub assertion: ExecutionDigest,
    pub proposal: ProposalResults,
    /// How many of `assertion.logs` (a suffix) are new relative to pending state.
    pub new_log_count: usize,
    pub signatures: Vec<Bytes>,
    pub on_chain_tx_hash: B256,
}

impl FinalizedAssertion {
    /// The logs this assertion adds, or `None` if `new_log_count` is out of range.
    pub fn new_logs(&self) -> Option<&[LogValue]> {
        let total = self.assertion.logs.len();
        total
            .checked_sub(self.new_log_count)
            .map(|start| &self.assertion.logs[start..])
    }

    pub fn sequence_num(&self) -> u64 {
        self.proposal.sequence_num
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_logs(n: usize, new: usize) -> FinalizedAssertion {
        let logs = (0..n).map(|i| LogValue::new(vec![i as u8])).collect();
        FinalizedAssertion {
            assertion: ExecutionDigest { logs, ..Default::default() },
            new_log_count: new,
            ..Default::default()
        }
    }

    #[test]
    fn new_logs_is_suffix() {
        let a = with_logs(5, 2);
        let new = a.new_logs().unwrap();
        assert_eq!(new.len(), 2);
        assert_eq!(new[0].as_bytes(), &[3]);
        assert_eq!(new[1].as_bytes(), &[4]);
    }

    #[test]
    fn new_logs_out_of_range() {
        assert!(with_logs(1, 2).new_logs().is_none());
        assert_eq!(with_logs(0, 0).new_logs().unwrap().len(), 0);
    }

    #[test]
    fn deserializes_camel_case() {
        let json = serde_json::json!({
            "assertion": { "afterHash": B256::ZERO, "numSteps": 7, "outMsgsHash": B256::ZERO, "logs": ["0x01"] },
            "proposal": {
                "sequenceNum": 3,
                "beforeHash": B256::ZERO,
                "timeBounds": { "start": 1, "end": 9 },
                "newInboxHash": B256::ZERO,
                "originalInboxHash": B256::ZERO,
                "assertion": { "afterHash": B256::ZERO, "numSteps": 7, "outMsgsHash": B256::ZERO, "logs": ["0x01"] }
            },
            "newLogCount": 1,
            "signatures": ["0xdead"],
            "onChainTxHash": B256::ZERO
        });
        let a: FinalizedAssertion = serde_json::from_value(json).unwrap();
        assert_eq!(a.sequence_num(), 3);
        assert_eq!(a.assertion, a.proposal.assertion);
        assert_eq!(a.assertion.logs[0].as_bytes(), &[1]);
    }
}
