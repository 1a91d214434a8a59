//! Hash primitives behind the log commitment and proposal partial hash.
//!
//! The commitment must match what the on-chain verifier computes, so the
//! default [`KeccakScheme`] uses Solidity-packed `keccak256` throughout:
//! every input is a fixed-width big-endian word concatenated without padding.

use alloy_primitives::B256;
use tiny_keccak::{Hasher, Keccak};

use crate::assertion::{ExecutionDigest, LogValue, ProposalResults};

/// The three hash operations the tracker needs.
pub trait HashScheme: Send + Sync {
    /// Extend a hash chain: `H(prev ‖ value)`.
    fn chain(&self, prev: B256, value: B256) -> B256;

    /// Content hash of one log value.
    fn value_hash(&self, value: &LogValue) -> B256;

    /// Commitment to a proposal's parameters, bound to the validators' signatures.
    fn partial_hash(&self, instance_id: B256, proposal: &ProposalResults) -> B256;
}

/// Solidity-compatible keccak-256 scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeccakScheme;

impl KeccakScheme {
    fn digest_hash(&self, digest: &ExecutionDigest) -> B256 {
        let logs_acc = digest
            .logs
            .iter()
            .fold(B256::ZERO, |acc, v| self.chain(acc, self.value_hash(v)));
        keccak(&[
            digest.after_hash.as_slice(),
            &digest.num_steps.to_be_bytes(),
            digest.out_msgs_hash.as_slice(),
            logs_acc.as_slice(),
        ])
    }
}

impl HashScheme for KeccakScheme {
    fn chain(&self, prev: B256, value: B256) -> B256 {
        keccak(&[prev.as_slice(), value.as_slice()])
    }

    fn value_hash(&self, value: &LogValue) -> B256 {
        keccak(&[value.as_bytes()])
    }

    fn partial_hash(&self, instance_id: B256, proposal: &ProposalResults) -> B256 {
        let digest = self.digest_hash(&proposal.assertion);
        keccak(&[
            instance_id.as_slice(),
            &proposal.sequence_num.to_be_bytes(),
            proposal.before_hash.as_slice(),
            &proposal.time_bounds.start.to_be_bytes(),
            &proposal.time_bounds.end.to_be_bytes(),
            proposal.new_inbox_hash.as_slice(),
            proposal.original_inbox_hash.as_slice(),
            digest.as_slice(),
        ])
    }
}

/// Recompute a commitment from a starting hash and a window of value hashes.
///
/// `fold_chain(scheme, record.logs_pre_hash, &window)` is what a verifier runs
/// against a signed post-hash.
pub fn fold_chain(scheme: &dyn HashScheme, start: B256, value_hashes: &[B256]) -> B256 {
    value_hashes.iter().fold(start, |acc, v| scheme.chain(acc, *v))
}

fn keccak(parts: &[&[u8]]) -> B256 {
    let mut k = Keccak::v256();
    for part in parts {
        k.update(part);
    }
    let mut out = [0u8; 32];
    k.finalize(&mut out);
    B256::from(out)
}
