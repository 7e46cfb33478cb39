use async_trait::async_trait;
use sqlx::MySqlPool;

use super::models::{NewReceipt, Receipt};
use crate::core::error::is_unique_violation;
use crate::core::{AppError, InsertOutcome, Result};

#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Receipt>>;

    async fn find_by_payment_id(&self, payment_id: i64) -> Result<Option<Receipt>>;

    /// Insert-or-get on `payment_id`; a clash on `receipt_no` alone is a conflict
    async fn insert_or_get(&self, receipt: &NewReceipt) -> Result<InsertOutcome<Receipt>>;

    /// Removes a receipt whose document could not be rendered
    async fn delete(&self, id: i64) -> Result<()>;
}

const SELECT_RECEIPT: &str = r#"
    SELECT id, payment_id, receipt_no, pdf_path, created_by, created_at
    FROM receipts
"#;

pub struct MySqlReceiptRepository {
    pool: MySqlPool,
}

impl MySqlReceiptRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReceiptRepository for MySqlReceiptRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Receipt>> {
        let receipt = sqlx::query_as::<_, Receipt>(&format!("{} WHERE id = ?", SELECT_RECEIPT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(receipt)
    }

    async fn find_by_payment_id(&self, payment_id: i64) -> Result<Option<Receipt>> {
        let receipt =
            sqlx::query_as::<_, Receipt>(&format!("{} WHERE payment_id = ?", SELECT_RECEIPT))
                .bind(payment_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(receipt)
    }

    async fn insert_or_get(&self, receipt: &NewReceipt) -> Result<InsertOutcome<Receipt>> {
        if let Some(existing) = self.find_by_payment_id(receipt.payment_id).await? {
            return Ok(InsertOutcome::Existing(existing));
        }

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO receipts (payment_id, receipt_no, pdf_path, created_by)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(receipt.payment_id)
        .bind(&receipt.receipt_no)
        .bind(&receipt.pdf_path)
        .bind(receipt.created_by)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(result) => {
                tx.commit().await?;
                let id = result.last_insert_id() as i64;
                self.find_by_id(id)
                    .await?
                    .map(InsertOutcome::Created)
                    .ok_or_else(|| AppError::internal("Receipt was created but not found"))
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                match self.find_by_payment_id(receipt.payment_id).await? {
                    Some(existing) => {
                        tracing::warn!(
                            payment_id = receipt.payment_id,
                            "Receipt insert lost a race, returning existing row"
                        );
                        Ok(InsertOutcome::Existing(existing))
                    }
                    None => Err(AppError::conflict(format!(
                        "Receipt number {} is already in use",
                        receipt.receipt_no
                    ))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM receipts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
