use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::{AppError, Currency, InsertOutcome, Result};
use crate::modules::gateways::PaymentGateway;
use crate::modules::invoices::models::{Invoice, InvoiceStatus};
use crate::modules::invoices::repositories::InvoiceRepository;
use crate::modules::messaging::Messenger;
use crate::modules::payments::models::{
    ImmediatePayment, NewPayment, Payment, PaymentOrder, PaymentStatus, WebhookOutcome,
    WebhookPayload,
};
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::receipts::ReceiptIssuer;
use crate::modules::reconciliation::ReconciliationContextBuilder;
use crate::modules::students::StudentRepository;

const MANUAL_PROVIDER: &str = "manual";

/// Records payments idempotently and keeps invoice status in step with them.
///
/// The idempotency key (and the provider transaction pair) is the only
/// concurrency primitive; there is no application-level locking.
pub struct PaymentRecorder {
    payments: Arc<dyn PaymentRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    students: Arc<dyn StudentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    receipts: Arc<ReceiptIssuer>,
    reconciliation: Arc<ReconciliationContextBuilder>,
    messenger: Arc<dyn Messenger>,
    currency: Currency,
    fallback_email: Option<String>,
}

impl PaymentRecorder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        students: Arc<dyn StudentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        receipts: Arc<ReceiptIssuer>,
        reconciliation: Arc<ReconciliationContextBuilder>,
        messenger: Arc<dyn Messenger>,
        currency: Currency,
        fallback_email: Option<String>,
    ) -> Self {
        Self {
            payments,
            invoices,
            students,
            gateway,
            receipts,
            reconciliation,
            messenger,
            currency,
            fallback_email,
        }
    }

    /// Record a payment against an invoice.
    ///
    /// Returns `Existing` without touching any row when the idempotency key
    /// (or provider transaction) was already recorded. A newly captured
    /// payment re-evaluates the invoice's paid status.
    pub async fn create_payment(
        &self,
        invoice_id: i64,
        provider: &str,
        provider_txn_id: &str,
        amount: Decimal,
        status: PaymentStatus,
        idempotency_key: Option<String>,
    ) -> Result<InsertOutcome<Payment>> {
        let invoice = self.find_invoice(invoice_id).await?;

        let payment = NewPayment::new(
            invoice.id,
            provider,
            provider_txn_id,
            amount,
            status,
            idempotency_key,
            &self.currency,
        )?;

        let outcome = self.payments.insert_or_get(&payment).await?;

        match &outcome {
            InsertOutcome::Created(recorded) => {
                tracing::info!(
                    payment_id = recorded.id,
                    invoice_no = %invoice.invoice_no,
                    amount = %recorded.amount,
                    status = %recorded.status,
                    "Payment recorded"
                );
                if recorded.status.is_captured() {
                    self.evaluate_paid_threshold(invoice.id).await?;
                }
            }
            InsertOutcome::Existing(existing) => {
                tracing::warn!(
                    payment_id = existing.id,
                    idempotency_key = ?existing.idempotency_key,
                    "Idempotent replay, payment already recorded"
                );
            }
        }

        Ok(outcome)
    }

    /// Capture a payment taken at invoice creation, filling in defaults
    pub async fn record_immediate(
        &self,
        invoice: &Invoice,
        immediate: ImmediatePayment,
    ) -> Result<InsertOutcome<Payment>> {
        let provider = immediate
            .provider
            .unwrap_or_else(|| MANUAL_PROVIDER.to_string());
        let provider_txn_id = immediate
            .provider_txn_id
            .unwrap_or_else(|| format!("manual-{}", Uuid::new_v4()));
        let idempotency_key = immediate
            .idempotency_key
            .unwrap_or_else(|| provider_txn_id.clone());
        let amount = immediate.amount.unwrap_or(invoice.amount_due);

        self.create_payment(
            invoice.id,
            &provider,
            &provider_txn_id,
            amount,
            PaymentStatus::Captured,
            Some(idempotency_key),
        )
        .await
    }

    /// Recompute paid_amount from every captured payment and update the status if it moved
    pub async fn evaluate_paid_threshold(&self, invoice_id: i64) -> Result<InvoiceStatus> {
        let invoice = self.find_invoice(invoice_id).await?;
        let paid_amount = self.payments.captured_total(invoice.id).await?;
        let status = InvoiceStatus::for_paid_amount(invoice.amount_due, paid_amount);

        if status != invoice.status {
            self.invoices.update_status(invoice.id, status).await?;
            tracing::info!(
                invoice_no = %invoice.invoice_no,
                paid_amount = %paid_amount,
                amount_due = %invoice.amount_due,
                status = %status,
                "Invoice status changed"
            );
        }

        Ok(status)
    }

    /// Handle a signed capture notification from the gateway.
    ///
    /// Signature failure is a hard rejection and records nothing. A replayed
    /// idempotency key yields `Ignored`. A fresh capture issues its receipt
    /// with the system actor and notifies the guardian.
    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome> {
        if !self.gateway.verify_webhook(payload, signature) {
            return Err(AppError::signature("Invalid webhook signature"));
        }

        let event: WebhookPayload = serde_json::from_slice(payload)?;
        let invoice_id = event
            .invoice_id
            .ok_or_else(|| AppError::validation("Webhook payload is missing invoice_id"))?;

        let invoice = self.find_invoice(invoice_id).await?;

        let provider_txn_id = event
            .provider_txn_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("auto-{}", Uuid::new_v4()));
        let idempotency_key = event
            .idempotency_key
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| provider_txn_id.clone());
        let provider = event
            .provider
            .unwrap_or_else(|| self.gateway.name().to_string());
        let amount = event.amount.unwrap_or(invoice.amount_due);

        if let Some(existing) = self.payments.find_by_idempotency_key(&idempotency_key).await? {
            tracing::warn!(
                payment_id = existing.id,
                idempotency_key = %idempotency_key,
                "Webhook replay ignored"
            );
            return Ok(WebhookOutcome::idempotent_replay(Some(existing.id)));
        }

        let outcome = self
            .create_payment(
                invoice.id,
                &provider,
                &provider_txn_id,
                amount,
                PaymentStatus::Captured,
                Some(idempotency_key),
            )
            .await?;

        let payment = match outcome {
            InsertOutcome::Created(payment) => payment,
            InsertOutcome::Existing(existing) => {
                return Ok(WebhookOutcome::idempotent_replay(Some(existing.id)));
            }
        };

        let invoice = self.find_invoice(invoice.id).await?;

        // The capture is committed; a receipt failure must not turn it into a gateway retry
        let receipt = match self
            .receipts
            .create_receipt_and_render(payment.id, None, None)
            .await
        {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                tracing::error!(
                    payment_id = payment.id,
                    error = %e,
                    "Receipt issuance after webhook capture failed"
                );
                None
            }
        };

        self.notify_capture(&invoice, &payment).await;

        Ok(WebhookOutcome::Ok {
            payment_id: payment.id,
            invoice_id: invoice.id,
            invoice_status: invoice.status,
            receipt_no: receipt.as_ref().map(|r| r.receipt_no.clone()),
            pdf_path: receipt.map(|r| r.pdf_path),
        })
    }

    /// Create a gateway checkout order for an invoice, defaulting to its outstanding balance
    pub async fn create_payment_order(
        &self,
        invoice_id: i64,
        amount: Option<Decimal>,
    ) -> Result<PaymentOrder> {
        let invoice = self.find_invoice(invoice_id).await?;

        let amount = match amount {
            Some(amount) => amount,
            None => self.reconciliation.snapshot_for(&invoice).await?.balance,
        };
        self.currency
            .validate_amount(amount)
            .map_err(AppError::Validation)?;

        let order = self
            .gateway
            .create_order(amount, &self.currency, &invoice.invoice_no)
            .await?;

        Ok(PaymentOrder {
            order_id: order.id,
            invoice_id: invoice.id,
            invoice_no: invoice.invoice_no,
            amount: self.currency.round(amount),
            amount_minor: order.amount_minor,
            currency: order.currency,
            status: order.status,
        })
    }

    async fn notify_capture(&self, invoice: &Invoice, payment: &Payment) {
        let recipient = match self.students.find_by_id(invoice.student_id).await {
            Ok(student) => student
                .and_then(|s| s.guardian_email)
                .or_else(|| self.fallback_email.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load student for notification");
                self.fallback_email.clone()
            }
        };

        let Some(to) = recipient else {
            tracing::debug!(invoice_no = %invoice.invoice_no, "No recipient for payment notification");
            return;
        };

        let subject = format!("Payment received for invoice {}", invoice.invoice_no);
        let body = format!(
            "<p>We received {} against invoice {} (transaction {}).</p>",
            self.currency.format_amount(payment.amount),
            invoice.invoice_no,
            payment.provider_txn_id
        );

        if let Err(e) = self.messenger.send_email(&to, &subject, &body).await {
            tracing::warn!(
                to = %to,
                invoice_no = %invoice.invoice_no,
                error = %e,
                "Payment notification failed"
            );
        }
    }

    async fn find_invoice(&self, invoice_id: i64) -> Result<Invoice> {
        self.invoices
            .find_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice {}", invoice_id)))
    }
}
