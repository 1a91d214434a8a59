//! `chaintrack replay` / `chaintrack tx` — feed a fixture of finalized
//! assertions through a dispatcher, then query it.
//!
//! Fixture format (JSON):
//! ```json
//! {
//!   "instanceCreationTxHash": "0x…",
//!   "assertions": [
//!     {
//!       "sequenceNum": 0,
//!       "pendingOutcomes": [],
//!       "outcomes": [
//!         { "kind": "stop", "message": { "id": "0x…", "sender": "0x…", "destination": "0x…", "data": "0x" },
//!           "logs": [ { "address": "0x…", "topics": ["0x…"], "data": "0x…" } ] }
//!       ],
//!       "signatures": ["0x…"],
//!       "onChainTxHash": "0x…"
//!     }
//!   ]
//! }
//! ```
//!
//! `pendingOutcomes` are log values already pending before the assertion;
//! they extend the hash chain but produce no transaction records.

use std::path::Path;
use std::sync::Arc;

use alloy_primitives::{Bytes, B256};
use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use chaintrack_core::{
    Dispatcher, ExecutionDigest, FinalizedAssertion, JsonOutcomeDecoder, KeccakScheme, LogQuery,
    Outcome, ProposalResults, TimeBounds, TrackerConfig, TrackerError, TrackerHandle, TxTracker,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplayFile {
    #[serde(default)]
    instance_creation_tx_hash: Option<B256>,
    assertions: Vec<ReplayAssertion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplayAssertion {
    sequence_num: u64,
    #[serde(default)]
    before_hash: B256,
    #[serde(default)]
    time_bounds: TimeBounds,
    #[serde(default)]
    new_inbox_hash: B256,
    #[serde(default)]
    original_inbox_hash: B256,
    #[serde(default)]
    pending_outcomes: Vec<Outcome>,
    outcomes: Vec<Outcome>,
    #[serde(default)]
    signatures: Vec<Bytes>,
    #[serde(default)]
    on_chain_tx_hash: B256,
}

impl ReplayAssertion {
    fn into_finalized(self) -> FinalizedAssertion {
        let new_log_count = self.outcomes.len();
        let logs = self
            .pending_outcomes
            .iter()
            .chain(&self.outcomes)
            .map(JsonOutcomeDecoder::encode)
            .collect();
        let digest = ExecutionDigest { logs, ..Default::default() };
        FinalizedAssertion {
            proposal: ProposalResults {
                sequence_num: self.sequence_num,
                before_hash: self.before_hash,
                time_bounds: self.time_bounds,
                new_inbox_hash: self.new_inbox_hash,
                original_inbox_hash: self.original_inbox_hash,
                assertion: digest.clone(),
            },
            assertion: digest,
            new_log_count,
            signatures: self.signatures,
            on_chain_tx_hash: self.on_chain_tx_hash,
        }
    }
}

/// Load a fixture and ingest every assertion. Returns a live handle.
async fn replay(
    input: &Path,
    config: &TrackerConfig,
) -> Result<(TrackerHandle, JoinHandle<Result<TxTracker, TrackerError>>)> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let file: ReplayFile = serde_json::from_str(&content)
        .with_context(|| format!("invalid replay file '{}'", input.display()))?;

    let (creation_tx, creation_rx) = oneshot::channel();
    if let Some(hash) = file.instance_creation_tx_hash {
        let _ = creation_tx.send(hash);
    }

    let (handle, join) = Dispatcher::spawn(
        config,
        Arc::new(KeccakScheme),
        Arc::new(JsonOutcomeDecoder),
        creation_rx,
    );

    let total = file.assertions.len();
    for assertion in file.assertions {
        let sequence = assertion.sequence_num;
        handle
            .ingest(assertion.into_finalized())
            .await
            .with_context(|| format!("ingestion stopped at sequence {sequence}"))?;
    }
    tracing::info!(assertions = total, input = %input.display(), "Replay complete");
    Ok((handle, join))
}

/// Drop the handle and log the final tracker size.
async fn finish(
    handle: TrackerHandle,
    join: JoinHandle<Result<TxTracker, TrackerError>>,
) -> Result<()> {
    drop(handle);
    let tracker = join.await.context("dispatcher task panicked")??;
    let stats = tracker.stats();
    tracing::info!(
        assertions = stats.assertions,
        transactions = stats.transactions,
        bundles = stats.bundles,
        evm_logs = stats.evm_logs,
        "Tracker stats"
    );
    Ok(())
}

pub async fn run_logs(input: &Path, config: &TrackerConfig, query: LogQuery) -> Result<()> {
    let (handle, join) = replay(input, config).await?;

    let count = handle.assertion_count().await?;
    let logs = handle.find_logs(query).await?;
    let creation = handle.instance_creation_tx_hash().await.ok();

    let out = serde_json::json!({
        "assertionCount": count,
        "instanceCreationTxHash": creation,
        "logs": logs,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    finish(handle, join).await
}

pub async fn run_tx(input: &Path, config: &TrackerConfig, hash: B256) -> Result<()> {
    let (handle, join) = replay(input, config).await?;
    let record = handle.transaction_by_hash(hash).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    finish(handle, join).await
}
