use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::core::{AppError, Result};
use crate::modules::payments::PaymentRecorder;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Process a signed payment webhook
/// POST /webhooks/payments
///
/// The body is taken raw so the signature is checked over the exact bytes sent.
/// Replays answer 200 with `{"status": "ignored"}`.
pub async fn payment_webhook(
    req: HttpRequest,
    body: web::Bytes,
    recorder: web::Data<Arc<PaymentRecorder>>,
) -> Result<HttpResponse> {
    let signature = extract_signature(&req)?;

    let outcome = recorder.handle_webhook(&body, &signature).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

fn extract_signature(req: &HttpRequest) -> Result<String> {
    req.headers()
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::signature(format!("Missing {} header", SIGNATURE_HEADER)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhooks").route("/payments", web::post().to(payment_webhook)));
}
