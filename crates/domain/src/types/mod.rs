//! Domain data types

pub mod mapping;
pub mod order;
pub mod policy;
pub mod remote;
pub mod sync_state;

pub use mapping::{LocalEntity, Mapping, MappingKind, RemoteItem};
pub use order::{Order, OrderFee, OrderLine, OrderRefund, OrderStatus};
pub use policy::{RetryMode, RetryPolicy, SyncAction};
pub use remote::{
    ContactDraft, CreditNoteDraft, Datacenter, InvoiceDraft, InvoiceLine, PaymentDraft,
    RemoteContact, RemoteCreditNote, RemoteInvoice, RemotePayment,
};
pub use sync_state::{RefundEntry, SyncState, SyncStatus};
