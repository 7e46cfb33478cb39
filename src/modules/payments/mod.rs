// Payments module: payment capture, webhook handling, checkout orders

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Payment, PaymentStatus, WebhookOutcome};
pub use repositories::{MySqlPaymentRepository, PaymentRepository};
pub use services::PaymentRecorder;
