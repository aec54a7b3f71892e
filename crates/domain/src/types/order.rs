//! Local order model as consumed by the sync engine.
//!
//! Orders are owned by the host commerce platform; the engine reads them
//! through the `OrderRepository` port and never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a local order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Refunded,
    Cancelled,
    Failed,
}

/// A single line item on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Local product identifier, used as the mapping key.
    pub product_id: u64,
    pub name: String,
    /// Stock keeping unit; empty when the product has none.
    #[serde(default)]
    pub sku: String,
    pub quantity: f64,
    pub unit_price: f64,
}

/// An additional fee attached to an order (e.g. a payment-gateway bank fee).
///
/// The currency is optional because some gateways report fees without one;
/// the engine skips fee application in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFee {
    pub label: String,
    pub amount: f64,
    pub currency: Option<String>,
}

/// A refund issued against an order on the local side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRefund {
    pub id: u64,
    pub amount: f64,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An order as read from the host platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Human-facing order number (may differ from the id).
    pub number: String,
    pub status: OrderStatus,
    /// ISO 4217 currency code the order was placed in.
    pub currency: String,
    pub total: f64,
    pub customer_email: String,
    pub customer_name: String,
    pub lines: Vec<OrderLine>,
    #[serde(default)]
    pub fees: Vec<OrderFee>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Reference string used when correlating remote entities back to
    /// this order.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("order-{}", self.id)
    }
}
