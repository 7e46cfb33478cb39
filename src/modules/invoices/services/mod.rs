pub mod invoice_ledger;

pub use invoice_ledger::InvoiceLedger;
