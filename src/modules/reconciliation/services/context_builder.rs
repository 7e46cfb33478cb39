use std::sync::Arc;

use crate::core::{AppError, Currency, Result};
use crate::modules::documents::models::InvoiceDocument;
use crate::modules::fee_plans::{LineItemResolver, ResolveTarget};
use crate::modules::invoices::models::Invoice;
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::reconciliation::models::ReconciliationSnapshot;
use crate::modules::students::StudentRepository;

/// The only place invoice totals are computed.
///
/// Invoice documents, receipt documents and the snapshot endpoint all go
/// through here, so a receipt for instalment 2 of 3 shows the same
/// cumulative figures as the invoice at that moment.
pub struct ReconciliationContextBuilder {
    invoices: Arc<dyn InvoiceRepository>,
    payments: Arc<dyn PaymentRepository>,
    students: Arc<dyn StudentRepository>,
    resolver: Arc<LineItemResolver>,
    currency: Currency,
}

impl ReconciliationContextBuilder {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        payments: Arc<dyn PaymentRepository>,
        students: Arc<dyn StudentRepository>,
        resolver: Arc<LineItemResolver>,
        currency: Currency,
    ) -> Self {
        Self {
            invoices,
            payments,
            students,
            resolver,
            currency,
        }
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub async fn build(&self, invoice_id: i64) -> Result<ReconciliationSnapshot> {
        let invoice = self.find_invoice(invoice_id).await?;
        self.snapshot_for(&invoice).await
    }

    /// Snapshot for an invoice already in hand
    pub async fn snapshot_for(&self, invoice: &Invoice) -> Result<ReconciliationSnapshot> {
        let items = self.resolver.resolve(ResolveTarget::for_invoice(invoice)).await?;
        let paid_amount = self.payments.captured_total(invoice.id).await?;

        Ok(ReconciliationSnapshot::compute(
            invoice.id,
            items,
            Some(invoice.amount_due),
            paid_amount,
            &self.currency,
        ))
    }

    /// Render context for the invoice template
    pub async fn invoice_document(&self, invoice_id: i64) -> Result<InvoiceDocument> {
        let invoice = self.find_invoice(invoice_id).await?;
        self.document_for(&invoice).await
    }

    pub async fn document_for(&self, invoice: &Invoice) -> Result<InvoiceDocument> {
        let student = self
            .students
            .find_by_id(invoice.student_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Student {}", invoice.student_id)))?;

        let snapshot = self.snapshot_for(invoice).await?;

        let mut document = InvoiceDocument {
            invoice_id: invoice.id,
            invoice_no: invoice.invoice_no.clone(),
            student_name: student.display_name(),
            admission_no: student.admission_no.clone(),
            period: invoice.period.clone(),
            due_date: invoice.due_date,
            status: invoice.status,
            currency: self.currency.code().to_string(),
            items: Vec::new(),
            items_total: snapshot.items_total,
            total_due: snapshot.total_due,
            paid_amount: snapshot.paid_amount,
            balance: snapshot.balance,
        };
        document.totals_from(&snapshot);

        Ok(document)
    }

    async fn find_invoice(&self, invoice_id: i64) -> Result<Invoice> {
        self.invoices
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))
    }
}
