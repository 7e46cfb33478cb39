use std::sync::Arc;

use crate::core::{AppError, InsertOutcome, Result};
use crate::modules::documents::{DocumentContext, DocumentPaths, DocumentRenderer, ReceiptDocument};
use crate::modules::invoices::models::Invoice;
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::payments::models::Payment;
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::receipts::models::{generate_receipt_no, validate_receipt_no, NewReceipt, Receipt};
use crate::modules::receipts::repository::ReceiptRepository;
use crate::modules::reconciliation::ReconciliationContextBuilder;
use crate::modules::students::StudentRepository;
use crate::modules::users::{Capability, Role, User, UserRepository};

/// Issues exactly one receipt per captured payment.
///
/// Never writes Invoice or Payment rows.
pub struct ReceiptIssuer {
    receipts: Arc<dyn ReceiptRepository>,
    payments: Arc<dyn PaymentRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    students: Arc<dyn StudentRepository>,
    users: Arc<dyn UserRepository>,
    reconciliation: Arc<ReconciliationContextBuilder>,
    renderer: Arc<dyn DocumentRenderer>,
    paths: DocumentPaths,
}

impl ReceiptIssuer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        receipts: Arc<dyn ReceiptRepository>,
        payments: Arc<dyn PaymentRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        students: Arc<dyn StudentRepository>,
        users: Arc<dyn UserRepository>,
        reconciliation: Arc<ReconciliationContextBuilder>,
        renderer: Arc<dyn DocumentRenderer>,
        paths: DocumentPaths,
    ) -> Self {
        Self {
            receipts,
            payments,
            invoices,
            students,
            users,
            reconciliation,
            renderer,
            paths,
        }
    }

    /// Create the receipt for a payment and render its PDF.
    ///
    /// A second call for the same payment returns the existing receipt
    /// without allocating a new number or path. When rendering fails the
    /// receipt row is removed and the render error is returned.
    pub async fn create_receipt_and_render(
        &self,
        payment_id: i64,
        receipt_no: Option<String>,
        created_by: Option<i64>,
    ) -> Result<Receipt> {
        let (payment, invoice) = self.receiptable_payment(payment_id).await?;

        let explicit_actor = match created_by {
            Some(user_id) => Some(self.explicit_actor(user_id).await?),
            None => None,
        };

        if let Some(existing) = self.receipts.find_by_payment_id(payment.id).await? {
            tracing::debug!(
                payment_id = payment.id,
                receipt_no = %existing.receipt_no,
                "Receipt already issued"
            );
            return Ok(existing);
        }

        let actor = match explicit_actor {
            Some(user) => user,
            None => self.fallback_actor().await?,
        };

        let receipt_no = match receipt_no {
            Some(no) => validate_receipt_no(&no)?,
            None => generate_receipt_no(),
        };
        let pdf_path = self.paths.receipt_pdf(&receipt_no);

        let outcome = self
            .receipts
            .insert_or_get(&NewReceipt {
                payment_id: payment.id,
                receipt_no,
                pdf_path: pdf_path.to_string_lossy().into_owned(),
                created_by: actor.id,
            })
            .await?;

        let receipt = match outcome {
            InsertOutcome::Created(receipt) => receipt,
            InsertOutcome::Existing(receipt) => return Ok(receipt),
        };

        let document = self.document_for(&receipt, &payment, &invoice).await;
        let rendered = match document {
            Ok(document) => {
                self.renderer
                    .render(&DocumentContext::Receipt(document), &pdf_path)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = rendered {
            tracing::error!(
                payment_id = payment.id,
                receipt_no = %receipt.receipt_no,
                error = %e,
                "Receipt rendering failed, removing receipt"
            );
            if let Err(delete_err) = self.receipts.delete(receipt.id).await {
                tracing::error!(
                    receipt_id = receipt.id,
                    error = %delete_err,
                    "Failed to remove receipt after render failure"
                );
            }
            return Err(e);
        }

        tracing::info!(
            payment_id = payment.id,
            invoice_no = %invoice.invoice_no,
            receipt_no = %receipt.receipt_no,
            created_by = actor.id,
            "Receipt issued"
        );

        Ok(receipt)
    }

    pub async fn get_by_payment_id(&self, payment_id: i64) -> Result<Receipt> {
        self.receipts
            .find_by_payment_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Receipt for payment {}", payment_id)))
    }

    /// Render context for an issued receipt, recomputed from the current ledger
    pub async fn receipt_document(&self, receipt_id: i64) -> Result<ReceiptDocument> {
        let receipt = self
            .receipts
            .find_by_id(receipt_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Receipt {}", receipt_id)))?;

        let (payment, invoice) = self.receiptable_payment(receipt.payment_id).await?;
        self.document_for(&receipt, &payment, &invoice).await
    }

    /// Payment → invoice → student → captured status
    async fn receiptable_payment(&self, payment_id: i64) -> Result<(Payment, Invoice)> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment {}", payment_id)))?;

        let invoice = self
            .invoices
            .find_by_id(payment.invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", payment.invoice_id)))?;

        if self.students.find_by_id(invoice.student_id).await?.is_none() {
            return Err(AppError::not_found(format!("Student {}", invoice.student_id)));
        }

        if !payment.status.is_captured() {
            return Err(AppError::state(format!(
                "Payment {} is {}, only captured payments can be receipted",
                payment.id, payment.status
            )));
        }

        Ok((payment, invoice))
    }

    async fn explicit_actor(&self, user_id: i64) -> Result<User> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.has_capability(Capability::CreateReceipt) => Ok(user),
            Some(user) => Err(AppError::forbidden(format!(
                "User {} with role {} cannot create receipts",
                user.id, user.role
            ))),
            None => Err(AppError::forbidden(format!(
                "User {} cannot create receipts",
                user_id
            ))),
        }
    }

    /// Earliest admin/clerk, else a synthesized system admin
    async fn fallback_actor(&self) -> Result<User> {
        let roles = Role::with_capability(Capability::CreateReceipt);
        if let Some(user) = self.users.find_earliest_with_roles(&roles).await? {
            return Ok(user);
        }

        Ok(self.users.ensure_system_admin().await?.into_inner())
    }

    async fn document_for(
        &self,
        receipt: &Receipt,
        payment: &Payment,
        invoice: &Invoice,
    ) -> Result<ReceiptDocument> {
        let invoice_document = self.reconciliation.document_for(invoice).await?;

        Ok(ReceiptDocument {
            receipt_no: receipt.receipt_no.clone(),
            payment_id: payment.id,
            provider: payment.provider.clone(),
            provider_txn_id: payment.provider_txn_id.clone(),
            amount: payment.amount,
            items: invoice_document.items.clone(),
            items_total: invoice_document.items_total,
            total_due: invoice_document.total_due,
            paid_amount: invoice_document.paid_amount,
            balance: invoice_document.balance,
            issued_by: receipt.created_by,
            invoice: invoice_document,
        })
    }
}
