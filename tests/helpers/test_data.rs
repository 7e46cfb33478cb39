// Test data factory: real ledger services over the in-memory store

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;

use fee_ledger::core::Currency;
use fee_ledger::modules::documents::DocumentPaths;
use fee_ledger::modules::gateways::sign_payload;
use fee_ledger::modules::invoices::models::GenerateInvoiceRequest;
use fee_ledger::{AppServices, Collaborators, LedgerSettings, Repositories};

use super::fakes::{FakeGateway, RecordingMessenger, RecordingRenderer, WEBHOOK_SECRET};
use super::memory_store::MemoryStore;

pub const FALLBACK_EMAIL: &str = "accounts@school.example";

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub renderer: Arc<RecordingRenderer>,
    pub gateway: Arc<FakeGateway>,
    pub messenger: Arc<RecordingMessenger>,
    pub services: AppServices,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_fallback_email(Some(FALLBACK_EMAIL))
    }

    pub fn with_fallback_email(fallback_email: Option<&str>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let renderer = Arc::new(RecordingRenderer::default());
        let gateway = Arc::new(FakeGateway::default());
        let messenger = Arc::new(RecordingMessenger::default());

        let repos = Repositories {
            students: store.clone(),
            users: store.clone(),
            fee_plans: store.clone(),
            invoices: store.clone(),
            payments: store.clone(),
            receipts: store.clone(),
        };
        let collaborators = Collaborators {
            renderer: renderer.clone(),
            gateway: gateway.clone(),
            messenger: messenger.clone(),
        };
        let settings = LedgerSettings {
            currency: Currency::inr(),
            paths: DocumentPaths::new("data/invoices", "data/receipts"),
            fallback_email: fallback_email.map(String::from),
        };

        Self {
            store,
            renderer,
            gateway,
            messenger,
            services: AppServices::build(repos, collaborators, settings),
        }
    }

    /// A student on a plan with Tuition 1000 + Transport 500
    pub fn student_on_standard_plan(&self, guardian_email: Option<&str>) -> i64 {
        let student = self.store.add_student("Asha Rao", guardian_email);
        let plan = self.store.add_plan("Grade 5 Annual");
        self.store
            .add_component(plan.id, "Tuition", Some(Decimal::from(1000)));
        self.store
            .add_component(plan.id, "Transport", Some(Decimal::from(500)));
        self.store.assign_plan(student.id, plan.id, Decimal::ZERO);
        student.id
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn invoice_request(student_id: i64, invoice_no: &str) -> GenerateInvoiceRequest {
    GenerateInvoiceRequest {
        student_id,
        invoice_no: invoice_no.to_string(),
        period: "2025-Q1".to_string(),
        extra_amount: None,
        due_date: "2025-04-30".to_string(),
        immediate_payment: None,
    }
}

/// Serialized webhook body and its valid signature
pub fn signed_webhook(payload: &Value) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(payload).expect("serialize webhook");
    let signature = sign_payload(WEBHOOK_SECRET, &body).expect("sign webhook");
    (body, signature)
}
