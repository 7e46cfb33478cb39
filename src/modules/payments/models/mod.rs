mod payment;
mod webhook;

pub use payment::{CreatePaymentRequest, ImmediatePayment, NewPayment, Payment, PaymentStatus};
pub use webhook::{CreateOrderRequest, PaymentOrder, WebhookOutcome, WebhookPayload};
