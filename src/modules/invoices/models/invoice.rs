// Invoice: a billing record for a student covering a period
//
// Created once per invoice_no. amount_due is the settled total written by the
// invoice ledger at creation; status flips to paid when captured payments
// reach it. Invoices are never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};
use crate::modules::payments::models::ImmediatePayment;

/// Invoice status lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Captured payments have not reached amount_due
    Pending,

    /// Captured payments cover amount_due
    Paid,
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl InvoiceStatus {
    /// Paid-threshold rule: paid iff the captured total reaches the settled amount
    pub fn for_paid_amount(amount_due: Decimal, paid_amount: Decimal) -> Self {
        if paid_amount >= amount_due {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Pending
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// A persisted invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,

    /// Globally unique, externally visible key
    pub invoice_no: String,

    pub student_id: i64,

    /// Billing period label, e.g. "2025-04" or "Term1-2025"
    pub period: String,

    /// Settled total: resolved items plus any top-up at creation
    pub amount_due: Decimal,

    pub due_date: NaiveDate,

    pub status: InvoiceStatus,

    pub created_at: Option<DateTime<Utc>>,
}

/// Fields needed to insert an invoice row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub invoice_no: String,
    pub student_id: i64,
    pub period: String,
    pub due_date: NaiveDate,
}

impl NewInvoice {
    /// Create a new invoice draft with validation
    pub fn new(
        invoice_no: String,
        student_id: i64,
        period: String,
        due_date: NaiveDate,
    ) -> Result<Self> {
        Self::validate_invoice_no(&invoice_no)?;
        Self::validate_period(&period)?;

        if student_id <= 0 {
            return Err(AppError::validation(format!(
                "Invalid student id: {}",
                student_id
            )));
        }

        Ok(Self {
            invoice_no: invoice_no.trim().to_string(),
            student_id,
            period: period.trim().to_string(),
            due_date,
        })
    }

    fn validate_invoice_no(invoice_no: &str) -> Result<()> {
        let trimmed = invoice_no.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("invoice_no cannot be empty"));
        }

        if trimmed.len() > 64 {
            return Err(AppError::validation("invoice_no cannot exceed 64 characters"));
        }

        if trimmed.contains(['/', '\\']) || trimmed.contains("..") {
            return Err(AppError::validation(
                "invoice_no cannot contain path separators",
            ));
        }

        Ok(())
    }

    fn validate_period(period: &str) -> Result<()> {
        if period.trim().is_empty() {
            return Err(AppError::validation("period cannot be empty"));
        }

        if period.len() > 64 {
            return Err(AppError::validation("period cannot exceed 64 characters"));
        }

        Ok(())
    }
}

/// Request to materialize an invoice for a student
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub student_id: i64,
    pub invoice_no: String,
    pub period: String,

    /// Top-up added to the resolved plan total at creation time
    #[serde(default)]
    pub extra_amount: Option<Decimal>,

    /// `YYYY-MM-DD` or RFC 3339
    pub due_date: String,

    #[serde(default)]
    pub immediate_payment: Option<ImmediatePayment>,
}
