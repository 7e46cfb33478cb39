pub mod gateway_trait;
pub mod razorpay;

pub use gateway_trait::{GatewayOrder, PaymentGateway};
pub use razorpay::{sign_payload, RazorpayGateway};
