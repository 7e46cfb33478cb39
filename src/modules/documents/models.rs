use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::modules::invoices::models::{InvoiceStatus, LineItem};
use crate::modules::reconciliation::models::ReconciliationSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Receipt,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Invoice => write!(f, "invoice"),
            DocumentKind::Receipt => write!(f, "receipt"),
        }
    }
}

/// Everything the invoice template shows; totals come from one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDocument {
    pub invoice_id: i64,
    pub invoice_no: String,
    pub student_name: String,
    pub admission_no: Option<String>,
    pub period: String,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub currency: String,
    /// Resolved items, or the synthetic "Fees Due" line when none resolve
    pub items: Vec<LineItem>,
    pub items_total: Decimal,
    pub total_due: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
}

impl InvoiceDocument {
    pub fn totals_from(&mut self, snapshot: &ReconciliationSnapshot) {
        self.items = snapshot.display_items();
        self.items_total = snapshot.items_total;
        self.total_due = snapshot.total_due;
        self.paid_amount = snapshot.paid_amount;
        self.balance = snapshot.balance;
    }
}

/// Receipt for one instalment.
///
/// `amount` is this payment only; `paid_amount`, `balance`, `items` and
/// `items_total` are the invoice-level cumulative snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptDocument {
    pub receipt_no: String,
    pub payment_id: i64,
    pub provider: String,
    pub provider_txn_id: String,
    pub amount: Decimal,
    pub invoice: InvoiceDocument,
    pub items: Vec<LineItem>,
    pub items_total: Decimal,
    pub total_due: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub issued_by: i64,
}

/// Context handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "context", rename_all = "lowercase")]
pub enum DocumentContext {
    Invoice(InvoiceDocument),
    Receipt(ReceiptDocument),
}

impl DocumentContext {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentContext::Invoice(_) => DocumentKind::Invoice,
            DocumentContext::Receipt(_) => DocumentKind::Receipt,
        }
    }

    pub fn as_receipt(&self) -> Option<&ReceiptDocument> {
        match self {
            DocumentContext::Receipt(receipt) => Some(receipt),
            DocumentContext::Invoice(_) => None,
        }
    }

    pub fn as_invoice(&self) -> Option<&InvoiceDocument> {
        match self {
            DocumentContext::Invoice(invoice) => Some(invoice),
            DocumentContext::Receipt(_) => None,
        }
    }
}
