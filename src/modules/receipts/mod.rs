// Receipts module: one receipt per captured payment

pub mod controllers;
pub mod models;
pub mod repository;
pub mod services;

pub use models::{CreateReceiptRequest, NewReceipt, Receipt};
pub use repository::{MySqlReceiptRepository, ReceiptRepository};
pub use services::ReceiptIssuer;
