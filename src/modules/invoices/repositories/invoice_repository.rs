// InvoiceRepository: MySQL persistence for fee invoices
//
// Implements:
// - Insert-or-get on invoice_no with the settled amount
// - Read invoice by id / invoice_no
// - Update invoice status

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::core::error::is_unique_violation;
use crate::core::{AppError, InsertOutcome, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus, NewInvoice};

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>>;

    async fn find_by_invoice_no(&self, invoice_no: &str) -> Result<Option<Invoice>>;

    /// Insert-or-get on `invoice_no`.
    ///
    /// `amount_due` must already be settled; the transaction holds a single
    /// connection and runs no other queries. When another writer already
    /// holds the invoice_no the transaction is rolled back and the existing
    /// row is returned untouched.
    async fn create_settled(
        &self,
        invoice: &NewInvoice,
        amount_due: Decimal,
    ) -> Result<InsertOutcome<Invoice>>;

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<()>;
}

#[derive(FromRow)]
struct InvoiceRow {
    id: i64,
    invoice_no: String,
    student_id: i64,
    period: String,
    amount_due: Decimal,
    due_date: NaiveDate,
    status: String,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = AppError;

    fn try_from(row: InvoiceRow) -> Result<Self> {
        Ok(Invoice {
            id: row.id,
            invoice_no: row.invoice_no,
            student_id: row.student_id,
            period: row.period,
            amount_due: row.amount_due,
            due_date: row.due_date,
            status: row.status.parse().map_err(AppError::Internal)?,
            created_at: row.created_at,
        })
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, invoice_no, student_id, period, amount_due, due_date, status, created_at
    FROM fee_invoices
"#;

/// Repository for invoice database operations
pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    /// Create a new invoice repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!("{} WHERE id = ?", SELECT_INVOICE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Invoice::try_from).transpose()
    }

    async fn find_by_invoice_no(&self, invoice_no: &str) -> Result<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} WHERE invoice_no = ?",
            SELECT_INVOICE
        ))
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Invoice::try_from).transpose()
    }

    async fn create_settled(
        &self,
        invoice: &NewInvoice,
        amount_due: Decimal,
    ) -> Result<InsertOutcome<Invoice>> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO fee_invoices (invoice_no, student_id, period, amount_due, due_date, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invoice.invoice_no)
        .bind(invoice.student_id)
        .bind(&invoice.period)
        .bind(amount_due)
        .bind(invoice.due_date)
        .bind(InvoiceStatus::Pending.to_string())
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(result) => result.last_insert_id() as i64,
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                tracing::warn!(
                    invoice_no = %invoice.invoice_no,
                    "Invoice insert lost a race, returning existing row"
                );
                return self
                    .find_by_invoice_no(&invoice.invoice_no)
                    .await?
                    .map(InsertOutcome::Existing)
                    .ok_or_else(|| {
                        AppError::conflict(format!(
                            "Invoice {} conflicted but could not be re-fetched",
                            invoice.invoice_no
                        ))
                    });
            }
            Err(e) => return Err(e.into()),
        };

        let created = sqlx::query_as::<_, InvoiceRow>(&format!("{} WHERE id = ?", SELECT_INVOICE))
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from)
            .and_then(Invoice::try_from)?;

        tx.commit().await?;

        Ok(InsertOutcome::Created(created))
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<()> {
        let result = sqlx::query("UPDATE fee_invoices SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // MySQL reports zero when the value is unchanged, so confirm the row exists
            if self.find_by_id(id).await?.is_none() {
                return Err(AppError::not_found(format!("Invoice {}", id)));
            }
        }

        Ok(())
    }
}
