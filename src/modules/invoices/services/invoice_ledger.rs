use std::sync::Arc;

use rust_decimal::Decimal;

use crate::core::dates::parse_due_date;
use crate::core::{AppError, Currency, InsertOutcome, Result};
use crate::modules::documents::{DocumentContext, DocumentPaths, DocumentRenderer};
use crate::modules::fee_plans::{LineItemResolver, ResolveTarget};
use crate::modules::invoices::models::{sum_amounts, GenerateInvoiceRequest, Invoice, NewInvoice};
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::payments::PaymentRecorder;
use crate::modules::reconciliation::ReconciliationContextBuilder;
use crate::modules::students::StudentRepository;

/// Idempotent invoice creation keyed on invoice_no
pub struct InvoiceLedger {
    invoices: Arc<dyn InvoiceRepository>,
    students: Arc<dyn StudentRepository>,
    resolver: Arc<LineItemResolver>,
    recorder: Arc<PaymentRecorder>,
    reconciliation: Arc<ReconciliationContextBuilder>,
    renderer: Arc<dyn DocumentRenderer>,
    paths: DocumentPaths,
    currency: Currency,
}

impl InvoiceLedger {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        students: Arc<dyn StudentRepository>,
        resolver: Arc<LineItemResolver>,
        recorder: Arc<PaymentRecorder>,
        reconciliation: Arc<ReconciliationContextBuilder>,
        renderer: Arc<dyn DocumentRenderer>,
        paths: DocumentPaths,
        currency: Currency,
    ) -> Self {
        Self {
            invoices,
            students,
            resolver,
            recorder,
            reconciliation,
            renderer,
            paths,
            currency,
        }
    }

    /// Materialize an invoice for a student.
    ///
    /// `amount_due` settles to the resolved plan total plus `extra_amount`.
    /// If the invoice_no already exists (or a concurrent writer wins the
    /// insert) the existing invoice is returned unchanged and only its
    /// document is re-rendered.
    pub async fn generate_invoice(
        &self,
        request: GenerateInvoiceRequest,
    ) -> Result<InsertOutcome<Invoice>> {
        let due_date = parse_due_date(&request.due_date)?;
        let extra_amount = self.validate_extra_amount(request.extra_amount)?;

        if let Some(amount) = request.immediate_payment.as_ref().and_then(|p| p.amount) {
            self.currency
                .validate_amount(amount)
                .map_err(AppError::Validation)?;
        }

        let draft = NewInvoice::new(request.invoice_no, request.student_id, request.period, due_date)?;

        if let Some(existing) = self.invoices.find_by_invoice_no(&draft.invoice_no).await? {
            tracing::info!(invoice_no = %existing.invoice_no, "Invoice already exists");
            self.render(&existing).await?;
            return Ok(InsertOutcome::Existing(existing));
        }

        if self.students.find_by_id(draft.student_id).await?.is_none() {
            return Err(AppError::not_found(format!("Student {}", draft.student_id)));
        }

        let amount_due = self.settle(draft.student_id, extra_amount).await?;
        let outcome = self.invoices.create_settled(&draft, amount_due).await?;

        let invoice = match outcome {
            InsertOutcome::Created(invoice) => invoice,
            InsertOutcome::Existing(existing) => {
                self.render(&existing).await?;
                return Ok(InsertOutcome::Existing(existing));
            }
        };

        tracing::info!(
            invoice_id = invoice.id,
            invoice_no = %invoice.invoice_no,
            student_id = invoice.student_id,
            amount_due = %invoice.amount_due,
            "Invoice created"
        );

        if let Some(immediate) = request.immediate_payment {
            if immediate.amount.is_none() && invoice.amount_due <= Decimal::ZERO {
                tracing::warn!(
                    invoice_no = %invoice.invoice_no,
                    "Skipping immediate payment, nothing is due"
                );
            } else {
                self.recorder.record_immediate(&invoice, immediate).await?;
            }
        }

        let invoice = self
            .invoices
            .find_by_id(invoice.id)
            .await?
            .ok_or_else(|| AppError::internal("Invoice was created but not found"))?;

        self.render(&invoice).await?;

        Ok(InsertOutcome::Created(invoice))
    }

    /// Resolver total plus top-up.
    ///
    /// Resolved before the insert: an invoice that does not exist yet has no
    /// invoice-linked assignments, so the student's items are the full set.
    async fn settle(&self, student_id: i64, extra_amount: Decimal) -> Result<Decimal> {
        let items = self
            .resolver
            .resolve(ResolveTarget::for_student(student_id))
            .await?;

        self.currency
            .checked_total(sum_amounts(&items), extra_amount)
            .map_err(AppError::Validation)
    }

    fn validate_extra_amount(&self, extra_amount: Option<Decimal>) -> Result<Decimal> {
        match extra_amount {
            None => Ok(Decimal::ZERO),
            Some(amount) if amount.is_zero() => Ok(Decimal::ZERO),
            Some(amount) => {
                self.currency
                    .validate_amount(amount)
                    .map_err(AppError::Validation)?;
                Ok(amount)
            }
        }
    }

    async fn render(&self, invoice: &Invoice) -> Result<()> {
        let document = self.reconciliation.document_for(invoice).await?;
        let output = self.paths.invoice_pdf(&invoice.invoice_no);

        if let Err(e) = self
            .renderer
            .render(&DocumentContext::Invoice(document), &output)
            .await
        {
            tracing::error!(
                invoice_no = %invoice.invoice_no,
                error = %e,
                "Invoice rendering failed"
            );
            return Err(e);
        }

        Ok(())
    }
}
