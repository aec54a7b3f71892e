//! Per-order synchronization state machine.
//!
//! The engine owns all mutations of [`SyncState`]. Every public
//! operation takes the order's lock, runs the remote calls, and
//! persists the outcome (success or failure) before returning, so the
//! state repository always reflects the last attempt.
//!
//! Idempotency guards: a present `invoice_id` turns invoice creation
//! into a no-op, a present `payment_id` skips payment recording, and a
//! refund id with a recorded credit note is never sent again.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use ledgersync_domain::{
    ContactDraft, CreditNoteDraft, InvoiceDraft, InvoiceLine, LedgerSyncError, MappingKind, Order,
    PaymentDraft, RemoteContact, Result, SyncAction, SyncConfig, SyncState, SyncStatus,
};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::ports::{AccountingApi, OrderRepository, OrderSyncer, SyncStateRepository};
use crate::mapping::MappingService;

/// Drives order data through the remote accounting service.
pub struct OrderSyncEngine {
    orders: Arc<dyn OrderRepository>,
    states: Arc<dyn SyncStateRepository>,
    api: Arc<dyn AccountingApi>,
    mappings: Arc<MappingService>,
    config: SyncConfig,
    /// One lock per order id so overlapping triggers (retry tick, bulk
    /// run, manual action) never race on the same order.
    order_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl OrderSyncEngine {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        states: Arc<dyn SyncStateRepository>,
        api: Arc<dyn AccountingApi>,
        mappings: Arc<MappingService>,
        config: SyncConfig,
    ) -> Self {
        Self { orders, states, api, mappings, config, order_locks: DashMap::new() }
    }

    fn lock_for(&self, order_id: u64) -> Arc<Mutex<()>> {
        self.order_locks.entry(order_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Sync an order's invoice, creating it if needed and finalizing it
    /// unless `as_draft` is set.
    #[instrument(skip(self))]
    pub async fn sync_order(&self, order_id: u64, as_draft: bool) -> Result<SyncState> {
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let mut state = self.load_state(order_id).await?;
        let order = self.orders.get_order(order_id).await?;

        match self.sync_invoice(&order, &mut state, as_draft).await {
            Ok(()) => {
                // Re-syncing never moves an order backwards in the
                // state machine.
                let status = match state.status {
                    SyncStatus::Paid | SyncStatus::Refunded | SyncStatus::Submitted => {
                        state.status
                    }
                    _ if as_draft => SyncStatus::Draft,
                    _ => SyncStatus::Submitted,
                };
                state.record_success(status, Utc::now());
                self.states.put(&state).await?;
                info!(order_id, status = ?state.status, "order synced");
                Ok(state)
            }
            Err(err) => self.fail(state, err).await,
        }
    }

    /// Record the customer payment for an order's invoice.
    #[instrument(skip(self))]
    pub async fn apply_payment(&self, order_id: u64) -> Result<SyncState> {
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let mut state = self.load_state(order_id).await?;
        if state.payment_id.is_some() {
            info!(order_id, "payment already recorded, skipping");
            return Ok(state);
        }

        let order = self.orders.get_order(order_id).await?;
        match self.record_payment(&order, &mut state).await {
            Ok(()) => {
                state.record_success(SyncStatus::Paid, Utc::now());
                self.states.put(&state).await?;
                info!(order_id, payment_id = ?state.payment_id, "payment recorded");
                Ok(state)
            }
            Err(err) => self.fail(state, err).await,
        }
    }

    /// Mirror local refunds as remote credit notes.
    ///
    /// Each refund is persisted as soon as its credit note exists, so a
    /// failure partway through never loses completed work.
    #[instrument(skip(self))]
    pub async fn sync_refunds(&self, order_id: u64) -> Result<SyncState> {
        let lock = self.lock_for(order_id);
        let _guard = lock.lock().await;

        let mut state = self.load_state(order_id).await?;
        let order = self.orders.get_order(order_id).await?;
        let refunds = self.orders.get_refunds(order_id).await?;

        for refund in refunds {
            if state.has_refund_entry(refund.id) {
                continue;
            }

            let contact = match self.resolve_contact(&order, &mut state).await {
                Ok(contact) => contact,
                Err(err) => return self.fail(state, err).await,
            };

            let draft = CreditNoteDraft {
                customer_id: contact.id,
                invoice_id: state.invoice_id.clone(),
                reference_number: format!("refund-{}", refund.id),
                amount: refund.amount,
                reason: refund.reason.clone(),
            };

            match self.api.create_credit_note(&draft).await {
                Ok(note) => {
                    state.refund_entries.push(ledgersync_domain::RefundEntry {
                        refund_id: refund.id,
                        credit_note_id: note.id,
                        credit_note_number: Some(note.number),
                        amount: refund.amount,
                    });
                    state.record_success(SyncStatus::Refunded, Utc::now());
                    self.states.put(&state).await?;
                    info!(order_id, refund_id = refund.id, "credit note created");
                }
                Err(err) => return self.fail(state, err).await,
            }
        }

        Ok(state)
    }

    /// React to a local order-status change using the configured
    /// trigger table. Returns `None` when no action is configured for
    /// the new status.
    #[instrument(skip(self))]
    pub async fn handle_status_change(
        &self,
        order_id: u64,
        new_status: ledgersync_domain::OrderStatus,
    ) -> Result<Option<SyncState>> {
        let Some(action) = self.config.action_for(new_status) else {
            return Ok(None);
        };

        let state = match action {
            SyncAction::CreateDraft => self.sync_order(order_id, true).await?,
            SyncAction::CreateAndSubmit => self.sync_order(order_id, false).await?,
            SyncAction::CreateCreditNote => self.sync_refunds(order_id).await?,
        };
        Ok(Some(state))
    }

    /// Current sync state of an order, `None` before the first attempt.
    pub async fn get_sync_status(&self, order_id: u64) -> Result<Option<SyncState>> {
        self.states.get(order_id).await
    }

    /// Whether the remote connection works end to end.
    pub async fn test_connection(&self) -> Result<bool> {
        self.api.test_connection().await
    }

    async fn load_state(&self, order_id: u64) -> Result<SyncState> {
        Ok(self.states.get(order_id).await?.unwrap_or_else(|| SyncState::new(order_id)))
    }

    /// Persist a failed attempt and propagate the error.
    async fn fail(&self, mut state: SyncState, err: LedgerSyncError) -> Result<SyncState> {
        warn!(order_id = state.order_id, error = %err, "sync attempt failed");
        state.record_failure(&err.to_string(), err.category(), Utc::now());
        self.states.put(&state).await?;
        Err(err)
    }

    /// Ensure the order has a remote invoice, finalizing it unless
    /// `as_draft`.
    async fn sync_invoice(
        &self,
        order: &Order,
        state: &mut SyncState,
        as_draft: bool,
    ) -> Result<()> {
        if state.invoice_id.is_none() {
            let contact = self.resolve_contact(order, state).await?;
            let lines = self.build_invoice_lines(order).await?;
            let draft = InvoiceDraft {
                customer_id: contact.id,
                reference_number: order.reference(),
                currency_code: order.currency.clone(),
                line_items: lines,
            };
            let invoice = self.api.create_invoice(&draft).await?;
            state.invoice_id = Some(invoice.id);
            state.invoice_number = Some(invoice.number);
        }

        if !as_draft && matches!(state.status, SyncStatus::Unsynced | SyncStatus::Draft | SyncStatus::Error) {
            // invoice_id is set above or was already present.
            if let Some(invoice_id) = state.invoice_id.clone() {
                self.api.submit_invoice(&invoice_id).await?;
            }
        }
        Ok(())
    }

    async fn record_payment(&self, order: &Order, state: &mut SyncState) -> Result<()> {
        let Some(invoice_id) = state.invoice_id.clone() else {
            return Err(LedgerSyncError::Validation(format!(
                "order {} has no invoice to record a payment against",
                order.id
            )));
        };
        let contact = self.resolve_contact(order, state).await?;

        let payment = self
            .api
            .create_payment(&PaymentDraft {
                customer_id: contact.id,
                invoice_id,
                amount: order.total,
                bank_charges: self.bank_charges(order),
                reference_number: order.reference(),
            })
            .await?;
        state.payment_id = Some(payment.id);
        state.payment_number = Some(payment.number);
        Ok(())
    }

    /// Sum the gateway fees that can safely be booked as bank charges.
    ///
    /// Fees in another currency or with no currency at all are skipped
    /// with a warning rather than failing the payment.
    fn bank_charges(&self, order: &Order) -> f64 {
        let mut total = 0.0;
        for fee in &order.fees {
            match fee.currency.as_deref() {
                Some(c) if c.eq_ignore_ascii_case(&order.currency) => total += fee.amount,
                Some(c) => {
                    warn!(
                        order_id = order.id,
                        fee = %fee.label,
                        fee_currency = c,
                        order_currency = %order.currency,
                        "fee currency differs from order currency, skipping fee"
                    );
                }
                None => {
                    warn!(
                        order_id = order.id,
                        fee = %fee.label,
                        "fee has no currency reference, skipping fee"
                    );
                }
            }
        }
        total
    }

    /// Find or create the remote contact for the order's customer and
    /// verify its currency matches the order.
    async fn resolve_contact(
        &self,
        order: &Order,
        state: &mut SyncState,
    ) -> Result<RemoteContact> {
        let contact = if let Some(contact_id) = &state.contact_id {
            self.api.get_contact(contact_id).await?
        } else if let Some(found) =
            self.api.find_contact_by_email(&order.customer_email).await?
        {
            found
        } else {
            self.api
                .create_contact(&ContactDraft {
                    contact_name: order.customer_name.clone(),
                    email: order.customer_email.clone(),
                    currency_code: None,
                })
                .await?
        };

        state.contact_id = Some(contact.id.clone());
        state.contact_name = Some(contact.name.clone());

        if !contact.currency_code.eq_ignore_ascii_case(&order.currency) {
            return Err(LedgerSyncError::Validation(format!(
                "contact currency {} does not match order currency {}; reconcile currencies manually",
                contact.currency_code, order.currency
            )));
        }
        Ok(contact)
    }

    /// Translate order lines into invoice lines, attaching remote item
    /// ids where a mapping exists. Unmapped products go out as ad-hoc
    /// description lines.
    async fn build_invoice_lines(&self, order: &Order) -> Result<Vec<InvoiceLine>> {
        let item_map = self.mappings.get_all(MappingKind::Item).await?;

        Ok(order
            .lines
            .iter()
            .map(|line| InvoiceLine {
                item_id: item_map.get(&line.product_id.to_string()).cloned(),
                name: line.name.clone(),
                quantity: line.quantity,
                rate: line.unit_price,
            })
            .collect())
    }
}

#[async_trait]
impl OrderSyncer for OrderSyncEngine {
    async fn sync_order(&self, order_id: u64, as_draft: bool) -> Result<SyncState> {
        OrderSyncEngine::sync_order(self, order_id, as_draft).await
    }

    /// Re-run whatever the trigger table prescribes for the order's
    /// current local status, falling back to a plain invoice sync.
    async fn retry(&self, order_id: u64) -> Result<SyncState> {
        let order = self.orders.get_order(order_id).await?;
        match self.handle_status_change(order_id, order.status).await? {
            Some(state) => Ok(state),
            None => self.sync_order(order_id, self.config.as_draft_default).await,
        }
    }
}
