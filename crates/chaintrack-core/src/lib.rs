//! chaintrack-core — finalized-assertion tracking for a rollup chain.
//!
//! # Architecture
//!
//! ```text
//! FinalizedAssertion ─► Dispatcher (single task)
//!                           └── TxTracker
//!                                 ├── HashChainBuilder  (value + cumulative hashes, tx windows)
//!                                 ├── OutcomeDecoder    (Stop / Return / Revert)
//!                                 ├── AssertionStore    (append-only, height = index)
//!                                 └── TransactionIndex  (message id → record)
//! TrackerHandle ─► queries ─► find_logs / lookup ─► oneshot response
//! ```
//!
//! Nothing is persisted and nothing is evicted: the store and index grow for
//! the life of the process.

pub mod assertion;
pub mod chain;
pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod hashing;
pub mod index;
pub mod store;
pub mod tracker;
pub mod types;

pub use assertion::{ExecutionDigest, FinalizedAssertion, LogValue, ProposalResults, TimeBounds};
pub use chain::{HashChain, HashChainBuilder, TxWindow};
pub use config::{LogConfig, TrackerBuilder, TrackerConfig};
pub use decoder::{JsonOutcomeDecoder, Outcome, OutcomeDecoder};
pub use dispatcher::{Dispatcher, TrackerHandle};
pub use error::{DecodeError, TrackerError};
pub use filter::{find_logs, LogQuery};
pub use hashing::{fold_chain, HashScheme, KeccakScheme};
pub use index::TransactionIndex;
pub use store::AssertionStore;
pub use tracker::{TrackerStats, TxTracker};
pub use types::{AssertionRecord, EvmLog, EvmMessage, LogEntry, TransactionLogBundle, TransactionRecord};
