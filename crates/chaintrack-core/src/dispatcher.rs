//! The single-writer request dispatcher.
//!
//! One Tokio task owns the [`TxTracker`]. Finalized assertions arrive on an
//! unbounded channel, queries on a bounded mailbox, and the task handles them
//! one at a time in whatever order `select!` observes them. Every query
//! carries a `oneshot` sender for its answer, so delivering a response never
//! blocks the task.
//!
//! ```text
//! validator ──submit/ingest──┐
//!                            ├──► dispatcher task ──► TxTracker
//! callers ────query+oneshot──┘          │
//!                      ◄────response────┘
//! ```

use std::sync::Arc;

use alloy_primitives::B256;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::assertion::FinalizedAssertion;
use crate::config::TrackerConfig;
use crate::decoder::OutcomeDecoder;
use crate::error::TrackerError;
use crate::filter::LogQuery;
use crate::hashing::HashScheme;
use crate::tracker::TxTracker;
use crate::types::{LogEntry, TransactionRecord};

/// Ingestion event sent by the validator side.
struct Ingest {
    assertion: FinalizedAssertion,
    ack: Option<oneshot::Sender<u64>>,
}

/// Query sent from callers to the dispatcher task.
enum Query {
    AssertionCount {
        tx: oneshot::Sender<i64>,
    },
    InstanceCreationTxHash {
        tx: oneshot::Sender<Option<B256>>,
    },
    TransactionByHash {
        id: B256,
        tx: oneshot::Sender<TransactionRecord>,
    },
    FindLogs {
        query: LogQuery,
        tx: oneshot::Sender<Vec<LogEntry>>,
    },
}

impl Query {
    fn name(&self) -> &'static str {
        match self {
            Self::AssertionCount { .. } => "assertion_count",
            Self::InstanceCreationTxHash { .. } => "instance_creation_tx_hash",
            Self::TransactionByHash { .. } => "transaction_by_hash",
            Self::FindLogs { .. } => "find_logs",
        }
    }
}

/// State of the one-shot instance creation hash source.
enum CreationHash {
    Pending {
        rx: oneshot::Receiver<B256>,
        waiting: Vec<oneshot::Sender<Option<B256>>>,
    },
    Known(B256),
    Unavailable,
}

/// Cloneable client for a running dispatcher.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    assertions: mpsc::UnboundedSender<Ingest>,
    queries: mpsc::Sender<Query>,
}

impl TrackerHandle {
    /// Queue an assertion for ingestion without waiting for it.
    pub fn submit(&self, assertion: FinalizedAssertion) -> Result<(), TrackerError> {
        self.assertions
            .send(Ingest { assertion, ack: None })
            .map_err(|_| TrackerError::DispatcherClosed)
    }

    /// Ingest an assertion and wait until it is applied. Returns its height.
    ///
    /// Any query issued after this returns observes the assertion.
    pub async fn ingest(&self, assertion: FinalizedAssertion) -> Result<u64, TrackerError> {
        let (tx, rx) = oneshot::channel();
        self.assertions
            .send(Ingest { assertion, ack: Some(tx) })
            .map_err(|_| TrackerError::DispatcherClosed)?;
        rx.await.map_err(|_| TrackerError::ResponseDropped)
    }

    /// Height of the latest finalized assertion, `-1` if none.
    pub async fn assertion_count(&self) -> Result<i64, TrackerError> {
        self.request(|tx| Query::AssertionCount { tx }).await
    }

    /// Hash of the transaction that created the rollup instance.
    ///
    /// Waits until the upstream source has produced it.
    pub async fn instance_creation_tx_hash(&self) -> Result<B256, TrackerError> {
        self.request(|tx| Query::InstanceCreationTxHash { tx })
            .await?
            .ok_or(TrackerError::InstanceHashUnavailable)
    }

    /// Look up a transaction by message id; `found` is `false` if unknown.
    pub async fn transaction_by_hash(&self, id: B256) -> Result<TransactionRecord, TrackerError> {
        self.request(|tx| Query::TransactionByHash { id, tx }).await
    }

    pub async fn find_logs(&self, query: LogQuery) -> Result<Vec<LogEntry>, TrackerError> {
        self.request(|tx| Query::FindLogs { query, tx }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Query,
    ) -> Result<T, TrackerError> {
        let (tx, rx) = oneshot::channel();
        self.queries
            .send(make(tx))
            .await
            .map_err(|_| TrackerError::DispatcherClosed)?;
        rx.await.map_err(|_| TrackerError::ResponseDropped)
    }
}

/// The actor: owns the tracker and both inbound channels.
pub struct Dispatcher {
    tracker: TxTracker,
    assertions: mpsc::UnboundedReceiver<Ingest>,
    queries: mpsc::Receiver<Query>,
    creation: CreationHash,
}

impl Dispatcher {
    /// Create a dispatcher and the handle that talks to it.
    ///
    /// `creation_tx_hash` is the one-shot source of the instance creation hash.
    pub fn new(
        config: &TrackerConfig,
        scheme: Arc<dyn HashScheme>,
        decoder: Arc<dyn OutcomeDecoder>,
        creation_tx_hash: oneshot::Receiver<B256>,
    ) -> (Self, TrackerHandle) {
        let (assertion_tx, assertion_rx) = mpsc::unbounded_channel();
        let (query_tx, query_rx) = mpsc::channel(config.query_buffer.max(1));
        let dispatcher = Self {
            tracker: TxTracker::new(config.instance_id, scheme, decoder),
            assertions: assertion_rx,
            queries: query_rx,
            creation: CreationHash::Pending { rx: creation_tx_hash, waiting: Vec::new() },
        };
        let handle = TrackerHandle { assertions: assertion_tx, queries: query_tx };
        (dispatcher, handle)
    }

    /// Spawn the dispatcher on the current Tokio runtime.
    pub fn spawn(
        config: &TrackerConfig,
        scheme: Arc<dyn HashScheme>,
        decoder: Arc<dyn OutcomeDecoder>,
        creation_tx_hash: oneshot::Receiver<B256>,
    ) -> (TrackerHandle, JoinHandle<Result<TxTracker, TrackerError>>) {
        let (dispatcher, handle) = Self::new(config, scheme, decoder, creation_tx_hash);
        (handle, tokio::spawn(dispatcher.run()))
    }

    /// Run until every handle is dropped, or until a fatal ingestion error.
    ///
    /// On a clean shutdown the tracker is handed back to the caller.
    pub async fn run(mut self) -> Result<TxTracker, TrackerError> {
        tracing::info!("Dispatcher started");
        let mut assertions_open = true;
        let mut queries_open = true;

        while assertions_open || queries_open {
            let creation_pending = matches!(self.creation, CreationHash::Pending { .. });
            tokio::select! {
                ingest = self.assertions.recv(), if assertions_open => match ingest {
                    Some(ingest) => self.handle_ingest(ingest)?,
                    None => assertions_open = false,
                },
                query = self.queries.recv(), if queries_open => match query {
                    Some(query) => self.handle_query(query),
                    None => queries_open = false,
                },
                hash = creation_recv(&mut self.creation), if creation_pending => {
                    self.resolve_creation(hash);
                }
            }
        }

        tracing::info!(assertions = self.tracker.store().len(), "Dispatcher stopped");
        Ok(self.tracker)
    }

    fn handle_ingest(&mut self, ingest: Ingest) -> Result<(), TrackerError> {
        match self.tracker.ingest(&ingest.assertion) {
            Ok(height) => {
                if let Some(ack) = ingest.ack {
                    let _ = ack.send(height);
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Fatal ingestion error, stopping dispatcher");
                Err(e)
            }
        }
    }

    fn handle_query(&mut self, query: Query) {
        tracing::debug!(query = query.name(), "Handling query");
        let delivered = match query {
            Query::AssertionCount { tx } => tx.send(self.tracker.assertion_count()).is_ok(),
            Query::TransactionByHash { id, tx } => tx.send(self.tracker.transaction(&id)).is_ok(),
            Query::FindLogs { query, tx } => tx.send(self.tracker.find_logs(&query)).is_ok(),
            Query::InstanceCreationTxHash { tx } => match &mut self.creation {
                CreationHash::Known(hash) => tx.send(Some(*hash)).is_ok(),
                CreationHash::Unavailable => tx.send(None).is_ok(),
                CreationHash::Pending { waiting, .. } => {
                    waiting.push(tx);
                    true
                }
            },
        };
        if !delivered {
            tracing::debug!("Caller dropped its response channel");
        }
    }

    fn resolve_creation(&mut self, hash: Option<B256>) {
        let next = match hash {
            Some(hash) => {
                tracing::info!(tx = %hash, "Instance creation tx hash received");
                CreationHash::Known(hash)
            }
            None => {
                tracing::warn!("Instance creation tx hash source closed without a value");
                CreationHash::Unavailable
            }
        };
        if let CreationHash::Pending { waiting, .. } = std::mem::replace(&mut self.creation, next) {
            for tx in waiting {
                let _ = tx.send(hash);
            }
        }
    }
}

/// Await the creation hash if it is still pending; otherwise never resolves.
async fn creation_recv(state: &mut CreationHash) -> Option<B256> {
    match state {
        CreationHash::Pending { rx, .. } => rx.await.ok(),
        _ => std::future::pending().await,
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("tracker", &self.tracker).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Ingest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingest")
            .field("sequence", &self.assertion.sequence_num())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
