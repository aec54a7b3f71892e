//! Sequential bulk sync runs with progress reporting.
//!
//! Orders are processed strictly one at a time. The remote service
//! rate-limits aggressively, so sequential processing doubles as
//! backpressure; do not parallelize this without concurrency-limited
//! admission control in front of the remote client.

use std::sync::Arc;

use ledgersync_domain::{LedgerSyncError, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::sync::ports::OrderSyncer;

/// Emitted after each order in a bulk run resolves.
#[derive(Debug, Clone)]
pub struct BulkProgress {
    pub order_id: u64,
    /// Orders resolved so far, this one included.
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    /// Human-readable failure for this order, `None` on success.
    pub error: Option<String>,
}

/// Final accounting of a bulk run.
///
/// `processed == succeeded + failed` always holds; `processed < total`
/// only when the run was cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSummary {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Handle to an in-flight bulk run.
pub struct BulkRun {
    /// Per-order progress events, closed when the run finishes.
    /// Delivery is best-effort: events are dropped when the consumer
    /// lags behind the channel capacity.
    pub progress: mpsc::Receiver<BulkProgress>,
    cancel: CancellationToken,
    handle: JoinHandle<BulkSummary>,
}

impl BulkRun {
    /// Request cancellation. Takes effect between orders; the order in
    /// flight still runs to completion and nothing is rolled back.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to finish and return its summary.
    pub async fn join(self) -> Result<BulkSummary> {
        self.handle
            .await
            .map_err(|err| LedgerSyncError::Internal(format!("bulk run task failed: {err}")))
    }
}

/// Runs a list of orders through a syncer sequentially.
pub struct BulkOrchestrator {
    syncer: Arc<dyn OrderSyncer>,
}

impl BulkOrchestrator {
    #[must_use]
    pub fn new(syncer: Arc<dyn OrderSyncer>) -> Self {
        Self { syncer }
    }

    /// Start a bulk run over `order_ids` and return its handle.
    ///
    /// Per-order failures are counted and reported, never escalated;
    /// one bad order cannot abort the batch.
    #[must_use]
    pub fn start(&self, order_ids: Vec<u64>, as_draft: bool) -> BulkRun {
        let (tx, rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let syncer = self.syncer.clone();

        let handle = tokio::spawn(async move {
            let total = order_ids.len();
            let mut summary =
                BulkSummary { total, processed: 0, succeeded: 0, failed: 0, cancelled: false };
            info!(total, as_draft, "bulk sync started");

            for order_id in order_ids {
                if token.is_cancelled() {
                    summary.cancelled = true;
                    info!(processed = summary.processed, total, "bulk sync cancelled");
                    break;
                }

                let error = match syncer.sync_order(order_id, as_draft).await {
                    Ok(_) => {
                        summary.succeeded += 1;
                        None
                    }
                    Err(err) => {
                        warn!(order_id, error = %err, "bulk item failed");
                        summary.failed += 1;
                        Some(err.to_string())
                    }
                };
                summary.processed += 1;

                // Progress is best-effort; a slow or absent consumer
                // must not stall the run, so events overflowing the
                // channel are dropped rather than awaited.
                let _ = tx.try_send(BulkProgress {
                    order_id,
                    processed: summary.processed,
                    succeeded: summary.succeeded,
                    failed: summary.failed,
                    total,
                    error,
                });
            }

            info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                total,
                cancelled = summary.cancelled,
                "bulk sync finished"
            );
            summary
        });

        BulkRun { progress: rx, cancel, handle }
    }
}
