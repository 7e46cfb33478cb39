// Recording fakes for the collaborators the ledger does not own

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use fee_ledger::core::{AppError, Currency, Result};
use fee_ledger::modules::documents::{DocumentContext, DocumentRenderer};
use fee_ledger::modules::gateways::{sign_payload, GatewayOrder, PaymentGateway};
use fee_ledger::modules::messaging::Messenger;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Renderer that records every context instead of spawning wkhtmltopdf
#[derive(Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<(DocumentContext, PathBuf)>>,
    fail: AtomicBool,
}

impl RecordingRenderer {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn rendered(&self) -> Vec<(DocumentContext, PathBuf)> {
        self.rendered.lock().expect("renderer poisoned").clone()
    }

    pub fn last(&self) -> Option<(DocumentContext, PathBuf)> {
        self.rendered().pop()
    }

    pub fn count(&self) -> usize {
        self.rendered.lock().expect("renderer poisoned").len()
    }
}

#[async_trait]
impl DocumentRenderer for RecordingRenderer {
    async fn render(&self, context: &DocumentContext, output: &Path) -> Result<PathBuf> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::render("wkhtmltopdf exited with status 1"));
        }
        self.rendered
            .lock()
            .expect("renderer poisoned")
            .push((context.clone(), output.to_path_buf()));
        Ok(output.to_path_buf())
    }
}

/// Gateway that verifies HMAC signatures with a fixed secret and fakes orders
#[derive(Default)]
pub struct FakeGateway {
    orders: Mutex<Vec<GatewayOrder>>,
}

impl FakeGateway {
    pub fn orders(&self) -> Vec<GatewayOrder> {
        self.orders.lock().expect("gateway poisoned").clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &str {
        "razorpay"
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool {
        sign_payload(WEBHOOK_SECRET, payload)
            .map(|expected| expected == signature)
            .unwrap_or(false)
    }

    async fn create_order(
        &self,
        amount: Decimal,
        currency: &Currency,
        reference: &str,
    ) -> Result<GatewayOrder> {
        let mut orders = self.orders.lock().expect("gateway poisoned");
        let order = GatewayOrder {
            id: format!("order_test_{}", orders.len() + 1),
            amount_minor: currency.to_minor_units(amount).map_err(AppError::Validation)?,
            currency: currency.code().to_string(),
            reference: reference.to_string(),
            status: "created".to_string(),
        };
        orders.push(order.clone());
        Ok(order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl RecordingMessenger {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().expect("messenger poisoned").clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_email(&self, to: &str, subject: &str, body_html: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::internal("SMTP connection refused"));
        }
        self.sent.lock().expect("messenger poisoned").push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body_html: body_html.to_string(),
        });
        Ok(())
    }
}
