use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::invoices::models::InvoiceStatus;

/// Body of a signed payment webhook
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    /// Required; missing is a validation error
    #[serde(default)]
    pub invoice_id: Option<i64>,

    #[serde(default)]
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub provider_txn_id: Option<String>,

    #[serde(default)]
    pub idempotency_key: Option<String>,

    #[serde(default)]
    pub provider: Option<String>,
}

/// Result of handling a webhook. A replay is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookOutcome {
    Ok {
        payment_id: i64,
        invoice_id: i64,
        invoice_status: InvoiceStatus,
        receipt_no: Option<String>,
        pdf_path: Option<String>,
    },
    Ignored {
        reason: String,
        payment_id: Option<i64>,
    },
}

impl WebhookOutcome {
    pub fn idempotent_replay(payment_id: Option<i64>) -> Self {
        WebhookOutcome::Ignored {
            reason: "idempotent replay".to_string(),
            payment_id,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, WebhookOutcome::Ignored { .. })
    }
}

/// Checkout order requested for an invoice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    /// Defaults to the invoice's outstanding balance
    #[serde(default)]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub invoice_id: i64,
    pub invoice_no: String,
    pub amount: Decimal,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
}
