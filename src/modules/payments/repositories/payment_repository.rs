use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::core::error::is_unique_violation;
use crate::core::{AppError, InsertOutcome, Result};
use crate::modules::payments::models::{NewPayment, Payment, PaymentStatus};

/// Repository for payment persistence
///
/// Idempotency rests on two unique keys: `idempotency_key` and
/// `(provider, provider_txn_id)`.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>>;

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Payment>>;

    async fn find_by_provider_txn(
        &self,
        provider: &str,
        provider_txn_id: &str,
    ) -> Result<Option<Payment>>;

    /// Insert-or-get on the idempotency key and provider transaction pair
    async fn insert_or_get(&self, payment: &NewPayment) -> Result<InsertOutcome<Payment>>;

    /// Sum of all captured payments for the invoice, zero if none
    async fn captured_total(&self, invoice_id: i64) -> Result<Decimal>;
}

#[derive(FromRow)]
struct PaymentRow {
    id: i64,
    invoice_id: i64,
    provider: String,
    provider_txn_id: String,
    amount: Decimal,
    status: String,
    idempotency_key: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self> {
        Ok(Payment {
            id: row.id,
            invoice_id: row.invoice_id,
            provider: row.provider,
            provider_txn_id: row.provider_txn_id,
            amount: row.amount,
            status: row.status.parse().map_err(AppError::Internal)?,
            idempotency_key: row.idempotency_key,
            created_at: row.created_at,
        })
    }
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, invoice_id, provider, provider_txn_id, amount, status, idempotency_key, created_at
    FROM payments
"#;

pub struct MySqlPaymentRepository {
    pool: MySqlPool,
}

impl MySqlPaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_existing(&self, payment: &NewPayment) -> Result<Option<Payment>> {
        if let Some(key) = &payment.idempotency_key {
            if let Some(existing) = self.find_by_idempotency_key(key).await? {
                return Ok(Some(existing));
            }
        }

        self.find_by_provider_txn(&payment.provider, &payment.provider_txn_id)
            .await
    }
}

#[async_trait]
impl PaymentRepository for MySqlPaymentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{} WHERE id = ?", SELECT_PAYMENT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} WHERE idempotency_key = ?",
            SELECT_PAYMENT
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_provider_txn(
        &self,
        provider: &str,
        provider_txn_id: &str,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "{} WHERE provider = ? AND provider_txn_id = ?",
            SELECT_PAYMENT
        ))
        .bind(provider)
        .bind(provider_txn_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Payment::try_from).transpose()
    }

    async fn insert_or_get(&self, payment: &NewPayment) -> Result<InsertOutcome<Payment>> {
        if let Some(existing) = self.find_existing(payment).await? {
            return Ok(InsertOutcome::Existing(existing));
        }

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO payments (invoice_id, provider, provider_txn_id, amount, status, idempotency_key)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.invoice_id)
        .bind(&payment.provider)
        .bind(&payment.provider_txn_id)
        .bind(payment.amount)
        .bind(payment.status.to_string())
        .bind(&payment.idempotency_key)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(result) => {
                tx.commit().await?;
                let id = result.last_insert_id() as i64;
                self.find_by_id(id)
                    .await?
                    .map(InsertOutcome::Created)
                    .ok_or_else(|| AppError::internal("Payment was created but not found"))
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                tracing::warn!(
                    provider_txn_id = %payment.provider_txn_id,
                    "Payment insert lost a race, returning existing row"
                );
                self.find_existing(payment)
                    .await?
                    .map(InsertOutcome::Existing)
                    .ok_or_else(|| {
                        AppError::conflict(format!(
                            "Payment {} conflicted but could not be re-fetched",
                            payment.provider_txn_id
                        ))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn captured_total(&self, invoice_id: i64) -> Result<Decimal> {
        let aliases = PaymentStatus::CAPTURED_ALIASES;
        let total: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount)
            FROM payments
            WHERE invoice_id = ? AND status IN (?, ?, ?)
            "#,
        )
        .bind(invoice_id)
        .bind(aliases[0])
        .bind(aliases[1])
        .bind(aliases[2])
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }
}
