//! Razorpay-compatible gateway client.
//!
//! Orders go through the Orders API with basic auth; webhooks are signed as
//! `hex(HMAC-SHA256(raw_body, webhook_secret))`.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    policies::ExponentialBackoff, RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::gateway_trait::{GatewayOrder, PaymentGateway};
use crate::config::GatewayConfig;
use crate::core::{AppError, Currency, Result};

type HmacSha256 = Hmac<Sha256>;

const MAX_RETRIES: u32 = 3;

pub struct RazorpayGateway {
    client: ClientWithMiddleware,
    config: GatewayConfig,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
    receipt: Option<String>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    code: String,
    description: String,
}

/// Order creation is not idempotent, so only failures where the gateway
/// cannot have accepted the order are retried: connection errors and 429.
/// Timeouts and server errors may follow an accepted order and are surfaced.
struct OrderRetryStrategy;

impl RetryableStrategy for OrderRetryStrategy {
    fn handle(
        &self,
        res: &std::result::Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status().is_success() => None,
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                Some(Retryable::Transient)
            }
            Ok(_) => Some(Retryable::Fatal),
            Err(reqwest_middleware::Error::Reqwest(e)) if e.is_connect() => {
                Some(Retryable::Transient)
            }
            Err(_) => Some(Retryable::Fatal),
        }
    }
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                OrderRetryStrategy,
            ))
            .build();

        Self { client, config }
    }

    fn is_configured(&self) -> bool {
        !self.config.key_id.is_empty() && !self.config.key_secret.is_empty()
    }
}

/// Hex HMAC-SHA256 of `payload`, the format the gateway puts in the signature header
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Configuration("Invalid webhook secret length".to_string()))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &str {
        "razorpay"
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            tracing::warn!("Webhook signature is not valid hex");
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(self.config.webhook_secret.as_bytes()) else {
            return false;
        };
        mac.update(payload);

        let is_valid = mac.verify_slice(&expected).is_ok();
        if !is_valid {
            tracing::warn!("Webhook signature verification failed");
        }
        is_valid
    }

    async fn create_order(
        &self,
        amount: Decimal,
        currency: &Currency,
        reference: &str,
    ) -> Result<GatewayOrder> {
        if !self.is_configured() {
            return Err(AppError::Configuration(
                "Payment gateway credentials not configured".to_string(),
            ));
        }

        let amount_minor = currency.to_minor_units(amount).map_err(AppError::Validation)?;
        let request = CreateOrderRequest {
            amount: amount_minor,
            currency: currency.code(),
            receipt: reference,
        };

        let url = format!("{}/orders", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Order request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, "Gateway create_order response");

        if !status.is_success() {
            let detail = serde_json::from_str::<RazorpayError>(&body)
                .map(|e| format!("{} - {}", e.error.code, e.error.description))
                .unwrap_or(body);
            tracing::error!(status = %status, error = %detail, "Gateway order creation failed");
            return Err(AppError::gateway(format!("Order creation failed: {}", detail)));
        }

        let order: RazorpayOrder = serde_json::from_str(&body)?;
        tracing::info!(
            order_id = %order.id,
            amount_minor = order.amount,
            reference = %reference,
            "Gateway order created"
        );

        Ok(GatewayOrder {
            id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
            reference: order.receipt.unwrap_or_else(|| reference.to_string()),
            status: order.status,
        })
    }
}
