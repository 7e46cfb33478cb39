use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

const RECEIPT_PREFIX: &str = "REC-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Receipt {
    pub id: i64,
    /// Exactly one receipt per payment
    pub payment_id: i64,
    pub receipt_no: String,
    /// Deterministic from receipt_no, persisted before rendering
    pub pdf_path: String,
    pub created_by: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceipt {
    pub payment_id: i64,
    pub receipt_no: String,
    pub pdf_path: String,
    pub created_by: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReceiptRequest {
    pub payment_id: i64,
    #[serde(default)]
    pub receipt_no: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
}

/// `REC-` followed by 10 upper-case hex characters
pub fn generate_receipt_no() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", RECEIPT_PREFIX, hex[..10].to_uppercase())
}

/// Caller-supplied receipt numbers become file names, so they must be path-safe
pub fn validate_receipt_no(receipt_no: &str) -> Result<String> {
    let trimmed = receipt_no.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("receipt_no cannot be empty"));
    }

    if trimmed.len() > 64 {
        return Err(AppError::validation("receipt_no cannot exceed 64 characters"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::validation(
            "receipt_no may only contain letters, digits, '-' and '_'",
        ));
    }

    Ok(trimmed.to_string())
}
