pub mod payment_controller;
pub mod webhook_controller;

pub use payment_controller::configure;
pub use webhook_controller::{configure as configure_webhooks, SIGNATURE_HEADER};
