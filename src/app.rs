// Service wiring: repositories and external collaborators in, ledger services out

use std::sync::Arc;

use actix_web::web;
use sqlx::MySqlPool;

use crate::config::Config;
use crate::core::Currency;
use crate::modules::documents::{DocumentPaths, DocumentRenderer, WkhtmltopdfRenderer};
use crate::modules::fee_plans::{FeePlanRepository, LineItemResolver, MySqlFeePlanRepository};
use crate::modules::gateways::{PaymentGateway, RazorpayGateway};
use crate::modules::invoices::{self, InvoiceLedger, InvoiceRepository, MySqlInvoiceRepository};
use crate::modules::messaging::{LogMessenger, Messenger};
use crate::modules::payments::{self, MySqlPaymentRepository, PaymentRecorder, PaymentRepository};
use crate::modules::receipts::{self, MySqlReceiptRepository, ReceiptIssuer, ReceiptRepository};
use crate::modules::reconciliation::ReconciliationContextBuilder;
use crate::modules::students::{MySqlStudentRepository, StudentRepository};
use crate::modules::users::{MySqlUserRepository, UserRepository};

#[derive(Clone)]
pub struct Repositories {
    pub students: Arc<dyn StudentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub fee_plans: Arc<dyn FeePlanRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub receipts: Arc<dyn ReceiptRepository>,
}

impl Repositories {
    pub fn mysql(pool: &MySqlPool) -> Self {
        Self {
            students: Arc::new(MySqlStudentRepository::new(pool.clone())),
            users: Arc::new(MySqlUserRepository::new(pool.clone())),
            fee_plans: Arc::new(MySqlFeePlanRepository::new(pool.clone())),
            invoices: Arc::new(MySqlInvoiceRepository::new(pool.clone())),
            payments: Arc::new(MySqlPaymentRepository::new(pool.clone())),
            receipts: Arc::new(MySqlReceiptRepository::new(pool.clone())),
        }
    }
}

/// Capabilities the ledger consumes but does not own
#[derive(Clone)]
pub struct Collaborators {
    pub renderer: Arc<dyn DocumentRenderer>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub messenger: Arc<dyn Messenger>,
}

impl Collaborators {
    pub fn from_config(config: &Config) -> Self {
        Self {
            renderer: Arc::new(WkhtmltopdfRenderer::from_config(&config.documents)),
            gateway: Arc::new(RazorpayGateway::new(config.gateway.clone())),
            messenger: Arc::new(LogMessenger),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub currency: Currency,
    pub paths: DocumentPaths,
    pub fallback_email: Option<String>,
}

impl LedgerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            currency: config.app.currency.clone(),
            paths: DocumentPaths::from_config(&config.documents),
            fallback_email: config.notifications.fallback_email.clone(),
        }
    }
}

/// The ledger services, built once and shared by every worker
#[derive(Clone)]
pub struct AppServices {
    pub resolver: Arc<LineItemResolver>,
    pub reconciliation: Arc<ReconciliationContextBuilder>,
    pub receipts: Arc<ReceiptIssuer>,
    pub payments: Arc<PaymentRecorder>,
    pub invoices: Arc<InvoiceLedger>,
}

impl AppServices {
    pub fn build(repos: Repositories, collaborators: Collaborators, settings: LedgerSettings) -> Self {
        let resolver = Arc::new(LineItemResolver::new(repos.fee_plans.clone()));

        let reconciliation = Arc::new(ReconciliationContextBuilder::new(
            repos.invoices.clone(),
            repos.payments.clone(),
            repos.students.clone(),
            resolver.clone(),
            settings.currency.clone(),
        ));

        let receipts = Arc::new(ReceiptIssuer::new(
            repos.receipts.clone(),
            repos.payments.clone(),
            repos.invoices.clone(),
            repos.students.clone(),
            repos.users.clone(),
            reconciliation.clone(),
            collaborators.renderer.clone(),
            settings.paths.clone(),
        ));

        let payments = Arc::new(PaymentRecorder::new(
            repos.payments.clone(),
            repos.invoices.clone(),
            repos.students.clone(),
            collaborators.gateway.clone(),
            receipts.clone(),
            reconciliation.clone(),
            collaborators.messenger.clone(),
            settings.currency.clone(),
            settings.fallback_email.clone(),
        ));

        let invoices = Arc::new(InvoiceLedger::new(
            repos.invoices.clone(),
            repos.students.clone(),
            resolver.clone(),
            payments.clone(),
            reconciliation.clone(),
            collaborators.renderer.clone(),
            settings.paths.clone(),
            settings.currency,
        ));

        Self {
            resolver,
            reconciliation,
            receipts,
            payments,
            invoices,
        }
    }

    pub fn from_config(pool: &MySqlPool, config: &Config) -> Self {
        Self::build(
            Repositories::mysql(pool),
            Collaborators::from_config(config),
            LedgerSettings::from_config(config),
        )
    }

    /// Registers shared state and the `/api/v1` routes
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.invoices.clone()))
            .app_data(web::Data::new(self.payments.clone()))
            .app_data(web::Data::new(self.receipts.clone()))
            .app_data(web::Data::new(self.reconciliation.clone()))
            .configure(crate::modules::health::configure)
            .service(
                web::scope("/api/v1")
                    .configure(invoices::controllers::configure)
                    .configure(payments::controllers::configure)
                    .configure(payments::controllers::configure_webhooks)
                    .configure(receipts::controllers::configure),
            );
    }
}
