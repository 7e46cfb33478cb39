// Reconciliation module: the single computation of items_total / total_due / paid / balance

pub mod models;
pub mod services;

pub use models::ReconciliationSnapshot;
pub use services::ReconciliationContextBuilder;
