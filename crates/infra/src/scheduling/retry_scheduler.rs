//! Scheduled re-attempts of failed order syncs.
//!
//! On every tick the scheduler scans the failed orders and re-runs the
//! ones that are due under the retry policy. Only retryable failures
//! (network, rate limit) qualify; validation and auth failures wait for
//! an operator. Orders that exhaust a bounded policy are marked
//! permanently failed and surfaced through the notifier instead of
//! being retried forever.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ledgersync_core::{OrderSyncer, SyncNotifier, SyncStateRepository};
use ledgersync_domain::{LedgerSyncError, Result, RetryMode, RetryPolicy, SyncState};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Configuration for the retry scheduler.
#[derive(Debug, Clone)]
pub struct RetrySchedulerConfig {
    /// Interval between scans of the failed-order set.
    pub tick_interval: Duration,
    /// Join timeout when stopping.
    pub join_timeout: Duration,
}

impl Default for RetrySchedulerConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_secs(60), join_timeout: Duration::from_secs(5) }
    }
}

/// Retry scheduler with explicit lifecycle management.
pub struct RetryScheduler {
    states: Arc<dyn SyncStateRepository>,
    syncer: Arc<dyn OrderSyncer>,
    notifier: Arc<dyn SyncNotifier>,
    policy: RetryPolicy,
    config: RetrySchedulerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl RetryScheduler {
    pub fn new(
        states: Arc<dyn SyncStateRepository>,
        syncer: Arc<dyn OrderSyncer>,
        notifier: Arc<dyn SyncNotifier>,
        policy: RetryPolicy,
        config: RetrySchedulerConfig,
    ) -> Self {
        Self {
            states,
            syncer,
            notifier,
            policy,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the scheduler, spawning the background tick loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(LedgerSyncError::Internal("retry scheduler already running".into()));
        }

        info!(tick_secs = self.config.tick_interval.as_secs(), "starting retry scheduler");
        self.cancellation = CancellationToken::new();

        let states = Arc::clone(&self.states);
        let syncer = Arc::clone(&self.syncer);
        let notifier = Arc::clone(&self.notifier);
        let policy = self.policy;
        let tick_interval = self.config.tick_interval;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("retry scheduler loop cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(tick_interval) => {
                        if let Err(err) = run_tick(&states, &syncer, &notifier, &policy).await {
                            warn!(error = %err, "retry tick failed");
                        }
                    }
                }
            }
        });

        self.task_handle = Some(handle);
        Ok(())
    }

    /// Stop the scheduler and wait for the tick loop to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(LedgerSyncError::Internal("retry scheduler not running".into()));
        }

        info!("stopping retry scheduler");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    return Err(LedgerSyncError::Internal(format!(
                        "retry scheduler task panicked: {err}"
                    )));
                }
                Err(_) => {
                    return Err(LedgerSyncError::Internal(
                        "retry scheduler did not stop within the join timeout".into(),
                    ));
                }
            }
        }

        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when the tick loop is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Run one scan immediately, outside the scheduled loop.
    pub async fn tick(&self) -> Result<usize> {
        run_tick(&self.states, &self.syncer, &self.notifier, &self.policy).await
    }
}

/// Scan failed orders and retry the due ones. Returns the number of
/// retries attempted.
async fn run_tick(
    states: &Arc<dyn SyncStateRepository>,
    syncer: &Arc<dyn OrderSyncer>,
    notifier: &Arc<dyn SyncNotifier>,
    policy: &RetryPolicy,
) -> Result<usize> {
    if policy.mode == RetryMode::Manual {
        debug!("retry mode is manual, skipping tick");
        return Ok(0);
    }

    let failed = states.list_failed().await?;
    if failed.is_empty() {
        return Ok(0);
    }

    debug!(count = failed.len(), "scanning failed orders");
    let mut attempted = 0usize;

    for state in failed {
        if state.permanently_failed {
            continue;
        }
        if !state.last_error_category.is_some_and(|c| c.is_retryable()) {
            continue;
        }

        // record_failure has already counted this failure, so the
        // number of completed retries is one less.
        let retries_done = state.retry_count.saturating_sub(1);

        if !policy.allows_retry(retries_done) {
            mark_permanently_failed(states, notifier, state).await?;
            continue;
        }
        if !is_due(&state, policy, retries_done) {
            continue;
        }

        info!(order_id = state.order_id, retries_done, "retrying failed order");
        attempted += 1;
        // A failed retry updates the order's own state; it must not
        // stop the scan.
        if let Err(err) = syncer.retry(state.order_id).await {
            warn!(order_id = state.order_id, error = %err, "retry attempt failed");
        }
    }

    Ok(attempted)
}

fn is_due(state: &SyncState, policy: &RetryPolicy, retries_done: u32) -> bool {
    match state.last_attempt_at {
        Some(last) => Utc::now() >= last + policy.delay_before(retries_done),
        None => true,
    }
}

async fn mark_permanently_failed(
    states: &Arc<dyn SyncStateRepository>,
    notifier: &Arc<dyn SyncNotifier>,
    mut state: SyncState,
) -> Result<()> {
    let reason = state
        .last_error
        .clone()
        .unwrap_or_else(|| "retry budget exhausted".to_string());
    warn!(order_id = state.order_id, %reason, "order permanently failed");

    state.permanently_failed = true;
    states.put(&state).await?;
    notifier.permanent_failure(state.order_id, &reason).await;
    Ok(())
}
