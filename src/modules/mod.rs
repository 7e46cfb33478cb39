pub mod documents;
pub mod fee_plans;
pub mod gateways;
pub mod health;
pub mod invoices;
pub mod messaging;
pub mod payments;
pub mod receipts;
pub mod reconciliation;
pub mod students;
pub mod users;
