use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::modules::receipts::models::CreateReceiptRequest;
use crate::modules::receipts::ReceiptIssuer;

/// Issue (or return the existing) receipt for a payment
/// POST /receipts
pub async fn create_receipt(
    issuer: web::Data<Arc<ReceiptIssuer>>,
    request: web::Json<CreateReceiptRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let receipt = issuer
        .create_receipt_and_render(request.payment_id, request.receipt_no, request.created_by)
        .await?;

    Ok(HttpResponse::Ok().json(receipt))
}

/// GET /receipts/payment/{payment_id}
pub async fn get_by_payment(
    issuer: web::Data<Arc<ReceiptIssuer>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let receipt = issuer.get_by_payment_id(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(receipt))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/receipts")
            .route("", web::post().to(create_receipt))
            .route("/payment/{payment_id}", web::get().to(get_by_payment)),
    );
}
