//! Port interfaces for sync operations

use async_trait::async_trait;
use ledgersync_domain::{
    ContactDraft, CreditNoteDraft, InvoiceDraft, Order, OrderRefund, PaymentDraft, RemoteContact,
    RemoteCreditNote, RemoteInvoice, RemoteItem, RemotePayment, Result, SyncState,
};

/// Read access to orders owned by the host commerce platform.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Load an order by id.
    async fn get_order(&self, order_id: u64) -> Result<Order>;

    /// Refunds issued against an order, oldest first.
    async fn get_refunds(&self, order_id: u64) -> Result<Vec<OrderRefund>>;
}

/// Persistence for per-order sync state.
///
/// Records are only ever created and overwritten, never deleted; the
/// fields double as an audit trail.
#[async_trait]
pub trait SyncStateRepository: Send + Sync {
    /// Sync state for an order, `None` before the first attempt.
    async fn get(&self, order_id: u64) -> Result<Option<SyncState>>;

    /// Create or overwrite the state for `state.order_id`.
    async fn put(&self, state: &SyncState) -> Result<()>;

    /// All orders currently in the error state.
    async fn list_failed(&self) -> Result<Vec<SyncState>>;
}

/// Typed operations against the remote accounting service.
#[async_trait]
pub trait AccountingApi: Send + Sync {
    /// Look up a contact by email; `None` when no contact matches.
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<RemoteContact>>;

    /// Fetch a contact by its remote id.
    async fn get_contact(&self, contact_id: &str) -> Result<RemoteContact>;

    /// Create a new contact.
    async fn create_contact(&self, draft: &ContactDraft) -> Result<RemoteContact>;

    /// Create a draft invoice.
    async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<RemoteInvoice>;

    /// Finalize a draft invoice.
    async fn submit_invoice(&self, invoice_id: &str) -> Result<RemoteInvoice>;

    /// Record a customer payment against an invoice.
    async fn create_payment(&self, draft: &PaymentDraft) -> Result<RemotePayment>;

    /// Raise a credit note for a refund.
    async fn create_credit_note(&self, draft: &CreditNoteDraft) -> Result<RemoteCreditNote>;

    /// List the remote item catalog.
    async fn list_items(&self) -> Result<Vec<RemoteItem>>;

    /// Whether the connection (credentials + organization) works.
    async fn test_connection(&self) -> Result<bool>;
}

/// Sync entry points consumed by the retry scheduler and bulk
/// orchestrator.
#[async_trait]
pub trait OrderSyncer: Send + Sync {
    /// Sync one order now, creating or updating its invoice.
    async fn sync_order(&self, order_id: u64, as_draft: bool) -> Result<SyncState>;

    /// Re-attempt a previously failed sync using the configured trigger
    /// action for the order's current status.
    async fn retry(&self, order_id: u64) -> Result<SyncState>;
}

/// Operator-facing notification hook for terminal failures.
#[async_trait]
pub trait SyncNotifier: Send + Sync {
    /// An order has exhausted its retry budget and will not be retried.
    async fn permanent_failure(&self, order_id: u64, reason: &str);
}
