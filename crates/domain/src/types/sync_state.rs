//! Per-order synchronization state.
//!
//! A `SyncState` record is created on the first sync attempt for an order
//! and mutated exclusively by the sync engine. Records are never deleted,
//! only superseded, so the fields double as an audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ErrorCategory;

/// Where an order stands in the remote accounting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Never synced.
    Unsynced,
    /// A draft invoice exists remotely.
    Draft,
    /// The invoice has been finalized/sent.
    Submitted,
    /// A customer payment has been recorded against the invoice.
    Paid,
    /// At least one credit note has been raised against the invoice.
    Refunded,
    /// The last attempt failed; see `last_error`.
    Error,
}

impl SyncStatus {
    /// True when the order has a remote counterpart of any kind.
    #[must_use]
    pub fn is_synced(self) -> bool {
        !matches!(self, Self::Unsynced | Self::Error)
    }
}

/// One refund that has been mirrored to the remote side as a credit note.
///
/// The pair (refund_id -> credit_note_id) is the idempotency guard for
/// refund syncing: a refund id that already has an entry is never sent
/// again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundEntry {
    pub refund_id: u64,
    pub credit_note_id: String,
    pub credit_note_number: Option<String>,
    pub amount: f64,
}

/// Synchronization state for a single order.
///
/// Invariants (enforced by the engine, checked by [`SyncState::is_consistent`]):
/// - `payment_id` present implies `invoice_id` present
/// - `status == Refunded` implies at least one refund entry
/// - a present `invoice_id` means "create invoice" must update or skip,
///   never create a duplicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub order_id: u64,
    pub status: SyncStatus,
    pub invoice_id: Option<String>,
    pub invoice_number: Option<String>,
    pub contact_id: Option<String>,
    pub contact_name: Option<String>,
    pub payment_id: Option<String>,
    pub payment_number: Option<String>,
    #[serde(default)]
    pub refund_entries: Vec<RefundEntry>,
    /// Last human-readable failure, preserved for display next to the
    /// affected order.
    pub last_error: Option<String>,
    /// Classification of `last_error`, consulted by the retry scheduler.
    pub last_error_category: Option<ErrorCategory>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    /// Set once the retry policy gives up on the order.
    #[serde(default)]
    pub permanently_failed: bool,
}

impl SyncState {
    /// Fresh state for an order that has never been synced.
    #[must_use]
    pub fn new(order_id: u64) -> Self {
        Self {
            order_id,
            status: SyncStatus::Unsynced,
            invoice_id: None,
            invoice_number: None,
            contact_id: None,
            contact_name: None,
            payment_id: None,
            payment_number: None,
            refund_entries: Vec::new(),
            last_error: None,
            last_error_category: None,
            last_attempt_at: None,
            retry_count: 0,
            permanently_failed: false,
        }
    }

    /// Record a failed attempt.
    ///
    /// `retry_count` tracks the automatic-retry budget, so it only
    /// advances for retryable failures; a fatal failure (auth,
    /// validation) leaves it untouched since the scheduler will never
    /// pick the order up.
    pub fn record_failure(&mut self, message: &str, category: ErrorCategory, at: DateTime<Utc>) {
        self.status = SyncStatus::Error;
        self.last_error = Some(message.to_string());
        self.last_error_category = Some(category);
        self.last_attempt_at = Some(at);
        if category.is_retryable() {
            self.retry_count += 1;
        }
    }

    /// Record a successful attempt, clearing the error bookkeeping.
    pub fn record_success(&mut self, status: SyncStatus, at: DateTime<Utc>) {
        self.status = status;
        self.last_error = None;
        self.last_error_category = None;
        self.last_attempt_at = Some(at);
        self.retry_count = 0;
        self.permanently_failed = false;
    }

    /// Whether this state has a credit note for the given refund already.
    #[must_use]
    pub fn has_refund_entry(&self, refund_id: u64) -> bool {
        self.refund_entries.iter().any(|e| e.refund_id == refund_id)
    }

    /// Check the structural invariants of the record.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.payment_id.is_some() && self.invoice_id.is_none() {
            return false;
        }
        if self.status == SyncStatus::Refunded && self.refund_entries.is_empty() {
            return false;
        }
        true
    }
}
