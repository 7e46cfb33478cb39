//! School fee ledger reconciliation engine
//!
//! Resolves what a student owes from fee-plan data, creates invoices and
//! records payments idempotently, computes one consistent reconciliation
//! snapshot per invoice and issues one receipt per payment instalment.

pub mod app;
pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use app::{AppServices, Collaborators, LedgerSettings, Repositories};
pub use modules::fee_plans::LineItemResolver;
pub use modules::invoices::InvoiceLedger;
pub use modules::payments::PaymentRecorder;
pub use modules::receipts::ReceiptIssuer;
pub use modules::reconciliation::ReconciliationContextBuilder;
