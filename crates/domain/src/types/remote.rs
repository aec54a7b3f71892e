//! Remote accounting entities and the request payloads sent to create them.

use serde::{Deserialize, Serialize};

/// Regional datacenter hosting the external accounting account.
///
/// Selects both the OAuth accounts host and the API host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datacenter {
    Us,
    Eu,
    In,
    Au,
    Jp,
    Ca,
}

impl Default for Datacenter {
    fn default() -> Self {
        Self::Us
    }
}

impl Datacenter {
    /// Top-level domain suffix for this region.
    #[must_use]
    fn tld(self) -> &'static str {
        match self {
            Self::Us => "com",
            Self::Eu => "eu",
            Self::In => "in",
            Self::Au => "com.au",
            Self::Jp => "jp",
            Self::Ca => "ca",
        }
    }

    /// Base URL of the OAuth token endpoint host.
    #[must_use]
    pub fn accounts_base_url(self) -> String {
        format!("https://accounts.ledgerhost.{}", self.tld())
    }

    /// Base URL of the accounting API host.
    #[must_use]
    pub fn api_base_url(self) -> String {
        format!("https://books.ledgerhost.{}/api/v3", self.tld())
    }
}

/// A contact (customer) in the remote accounting service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteContact {
    #[serde(rename = "contact_id")]
    pub id: String,
    #[serde(rename = "contact_name")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub currency_code: String,
}

/// An invoice in the remote accounting service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteInvoice {
    #[serde(rename = "invoice_id")]
    pub id: String,
    #[serde(rename = "invoice_number")]
    pub number: String,
    #[serde(default)]
    pub status: String,
}

/// A customer payment recorded against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePayment {
    #[serde(rename = "payment_id")]
    pub id: String,
    #[serde(rename = "payment_number", default)]
    pub number: String,
}

/// A credit note raised against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCreditNote {
    #[serde(rename = "creditnote_id")]
    pub id: String,
    #[serde(rename = "creditnote_number", default)]
    pub number: String,
}

/// Payload for creating a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDraft {
    pub contact_name: String,
    pub email: String,
    /// Omitted to let the remote default to the organization currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
}

/// One invoice line, resolved against the item mapping where possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Remote item id when the product is mapped; unmapped lines are sent
    /// as ad-hoc description lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub name: String,
    pub quantity: f64,
    pub rate: f64,
}

/// Payload for creating an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_id: String,
    /// Correlates the invoice back to the local order.
    pub reference_number: String,
    pub currency_code: String,
    pub line_items: Vec<InvoiceLine>,
}

/// Payload for recording a customer payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDraft {
    pub customer_id: String,
    pub invoice_id: String,
    pub amount: f64,
    /// Gateway fees in the order currency; zero when skipped.
    pub bank_charges: f64,
    pub reference_number: String,
}

/// Payload for creating a credit note for a refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditNoteDraft {
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    /// Correlates the credit note back to the local refund.
    pub reference_number: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datacenter_selects_regional_hosts() {
        assert_eq!(Datacenter::Us.accounts_base_url(), "https://accounts.ledgerhost.com");
        assert_eq!(Datacenter::Eu.api_base_url(), "https://books.ledgerhost.eu/api/v3");
        assert_eq!(Datacenter::Au.accounts_base_url(), "https://accounts.ledgerhost.com.au");
    }
}
