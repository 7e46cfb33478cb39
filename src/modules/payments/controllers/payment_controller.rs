use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::core::error::AppError;
use crate::modules::payments::models::{CreatePaymentRequest, Payment};
use crate::modules::payments::PaymentRecorder;

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment: Payment,
    /// True when the idempotency key had already been recorded
    pub replayed: bool,
}

/// Record a payment directly
/// POST /payments
pub async fn create_payment(
    recorder: web::Data<Arc<PaymentRecorder>>,
    request: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let outcome = recorder
        .create_payment(
            request.invoice_id,
            &request.provider,
            &request.provider_txn_id,
            request.amount,
            request.status,
            request.idempotency_key,
        )
        .await?;

    let replayed = outcome.is_replay();
    let response = PaymentResponse {
        payment: outcome.into_inner(),
        replayed,
    };

    if replayed {
        Ok(HttpResponse::Ok().json(response))
    } else {
        Ok(HttpResponse::Created().json(response))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/payments").route("", web::post().to(create_payment)));
}
