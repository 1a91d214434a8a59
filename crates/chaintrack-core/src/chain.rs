//! Log hash chain construction and per-transaction windows.
//!
//! For the log values `l[0..M]` of one assertion:
//!
//! ```text
//! value[i]      = V(l[i])
//! cumulative[i] = H(cumulative[i-1], value[i])      cumulative[-1] = 0x00..00
//! ```
//!
//! The last `N` log values are new. New transaction `i` (`0 <= i < N`) gets
//! `phi = M - N - (i + 1)`, a pre-hash of `cumulative[phi]` (zero when `phi < 0`)
//! and the tail `value[max(phi + 1, 0)..M]` of the value hashes. Folding that
//! tail onto the pre-hash reproduces `cumulative[M - 1]`, the post-hash.

use std::sync::Arc;

use alloy_primitives::B256;

use crate::assertion::LogValue;
use crate::hashing::HashScheme;

/// The value-hash and cumulative-hash sequences of one assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashChain {
    pub value_hashes: Vec<B256>,
    pub cumulative: Vec<B256>,
}

/// Commitment data handed to one new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxWindow {
    pub pre_hash: B256,
    pub value_hashes: Vec<B256>,
}

impl HashChain {
    /// Number of links (`M`).
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Last cumulative hash, zero for an empty chain.
    pub fn post_hash(&self) -> B256 {
        self.cumulative.last().copied().unwrap_or(B256::ZERO)
    }

    /// Window of new transaction `i` out of `new_count`.
    ///
    /// Callers guarantee `new_count <= self.len()` and `i < new_count`.
    pub fn window(&self, new_count: usize, i: usize) -> TxWindow {
        let m = self.len();
        let phi = m as i64 - new_count as i64 - (i as i64 + 1);
        let (pre_hash, start) = if phi >= 0 {
            (self.cumulative[phi as usize], phi as usize + 1)
        } else {
            (B256::ZERO, 0)
        };
        TxWindow {
            pre_hash,
            value_hashes: self.value_hashes[start..].to_vec(),
        }
    }

    /// Check the chain invariant against `scheme`.
    pub fn is_consistent(&self, scheme: &dyn HashScheme) -> bool {
        if self.value_hashes.len() != self.cumulative.len() {
            return false;
        }
        let mut prev = B256::ZERO;
        for (value, link) in self.value_hashes.iter().zip(&self.cumulative) {
            if scheme.chain(prev, *value) != *link {
                return false;
            }
            prev = *link;
        }
        true
    }
}

/// Builds [`HashChain`]s with a fixed hash scheme.
#[derive(Clone)]
pub struct HashChainBuilder {
    scheme: Arc<dyn HashScheme>,
}

impl HashChainBuilder {
    pub fn new(scheme: Arc<dyn HashScheme>) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &dyn HashScheme {
        self.scheme.as_ref()
    }

    /// Hash every log value in order and accumulate the chain.
    pub fn build(&self, logs: &[LogValue]) -> HashChain {
        let mut chain = HashChain {
            value_hashes: Vec::with_capacity(logs.len()),
            cumulative: Vec::with_capacity(logs.len()),
        };
        let mut acc = B256::ZERO;
        for log in logs {
            let value = self.scheme.value_hash(log);
            acc = self.scheme.chain(acc, value);
            chain.value_hashes.push(value);
            chain.cumulative.push(acc);
        }
        chain
    }
}

impl std::fmt::Debug for HashChainBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashChainBuilder").finish_non_exhaustive()
    }
}
