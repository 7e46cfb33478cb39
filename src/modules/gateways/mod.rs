// Gateways module: payment-gateway capability (webhook verification, orders)

pub mod services;

pub use services::{sign_payload, GatewayOrder, PaymentGateway, RazorpayGateway};
