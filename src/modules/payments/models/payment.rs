use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Currency, Result};

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Recorded but funds not yet confirmed
    Created,

    /// Funds confirmed; counts towards paid_amount
    Captured,

    /// Attempt failed; never counts
    Failed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Captured
    }
}

impl PaymentStatus {
    /// Only captured payments can be receipted or counted as paid
    pub fn is_captured(&self) -> bool {
        matches!(self, PaymentStatus::Captured)
    }

    /// Stored spellings that count as captured, including older rows
    pub const CAPTURED_ALIASES: [&'static str; 3] = ["captured", "paid", "posted"];
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Created => write!(f, "created"),
            PaymentStatus::Captured => write!(f, "captured"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" | "pending" => Ok(PaymentStatus::Created),
            "captured" | "paid" | "posted" => Ok(PaymentStatus::Captured),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// A payment against an invoice; immutable once captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub invoice_id: i64,
    pub provider: String,
    pub provider_txn_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub idempotency_key: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Validated payment ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub invoice_id: i64,
    pub provider: String,
    pub provider_txn_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub idempotency_key: Option<String>,
}

impl NewPayment {
    pub fn new(
        invoice_id: i64,
        provider: &str,
        provider_txn_id: &str,
        amount: Decimal,
        status: PaymentStatus,
        idempotency_key: Option<String>,
        currency: &Currency,
    ) -> Result<Self> {
        let provider = provider.trim();
        if provider.is_empty() {
            return Err(AppError::validation("provider cannot be empty"));
        }

        let provider_txn_id = provider_txn_id.trim();
        if provider_txn_id.is_empty() {
            return Err(AppError::validation("provider_txn_id cannot be empty"));
        }

        currency.validate_amount(amount).map_err(AppError::Validation)?;

        // Blank keys are treated as absent so they never collide on the unique index
        let idempotency_key = idempotency_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        Ok(Self {
            invoice_id,
            provider: provider.to_string(),
            provider_txn_id: provider_txn_id.to_string(),
            amount: currency.round(amount),
            status,
            idempotency_key,
        })
    }
}

/// Direct payment request (`POST /api/v1/payments`)
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub invoice_id: i64,
    pub provider: String,
    pub provider_txn_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Payment captured together with invoice generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImmediatePayment {
    /// Defaults to "manual"
    #[serde(default)]
    pub provider: Option<String>,

    /// Defaults to `manual-{uuid}`
    #[serde(default)]
    pub provider_txn_id: Option<String>,

    /// Defaults to the invoice's settled amount_due
    #[serde(default)]
    pub amount: Option<Decimal>,

    /// Defaults to the provider_txn_id
    #[serde(default)]
    pub idempotency_key: Option<String>,
}
