use crate::core::{Currency, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment gateway capability consumed by the payment recorder
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider name recorded on payments captured through this gateway
    fn name(&self) -> &str;

    /// Verify a webhook signature over the exact raw request body
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool;

    /// Create a checkout order for `amount` referencing an invoice
    async fn create_order(
        &self,
        amount: Decimal,
        currency: &Currency,
        reference: &str,
    ) -> Result<GatewayOrder>;
}

/// Order created at the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway order id
    pub id: String,

    /// Amount in the currency's smallest unit (paise for INR)
    pub amount_minor: i64,

    pub currency: String,

    /// Our reference, the invoice_no
    pub reference: String,

    pub status: String,
}
