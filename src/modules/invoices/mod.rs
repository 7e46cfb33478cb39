// Invoices module: invoice model, persistence and the invoice ledger

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{GenerateInvoiceRequest, Invoice, InvoiceStatus, LineItem, LineItemSource};
pub use repositories::{InvoiceRepository, MySqlInvoiceRepository};
pub use services::InvoiceLedger;
