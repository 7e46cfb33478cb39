use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::error::AppError;
use crate::core::InsertOutcome;
use crate::modules::invoices::models::GenerateInvoiceRequest;
use crate::modules::invoices::services::InvoiceLedger;
use crate::modules::payments::models::CreateOrderRequest;
use crate::modules::payments::PaymentRecorder;
use crate::modules::reconciliation::ReconciliationContextBuilder;

/// Generate (or re-fetch) an invoice
/// POST /invoices
///
/// 201 when created, 200 when the invoice_no already existed
pub async fn generate_invoice(
    ledger: web::Data<Arc<InvoiceLedger>>,
    request: web::Json<GenerateInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    match ledger.generate_invoice(request.into_inner()).await? {
        InsertOutcome::Created(invoice) => Ok(HttpResponse::Created().json(invoice)),
        InsertOutcome::Existing(invoice) => Ok(HttpResponse::Ok().json(invoice)),
    }
}

/// Current reconciliation snapshot
/// GET /invoices/{id}/snapshot
pub async fn get_snapshot(
    reconciliation: web::Data<Arc<ReconciliationContextBuilder>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let snapshot = reconciliation.build(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

/// Create a gateway checkout order
/// POST /invoices/{id}/orders
pub async fn create_order(
    recorder: web::Data<Arc<PaymentRecorder>>,
    path: web::Path<i64>,
    request: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order = recorder
        .create_payment_order(path.into_inner(), request.into_inner().amount)
        .await?;

    Ok(HttpResponse::Created().json(order))
}

/// Configure invoice routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invoices")
            .route("", web::post().to(generate_invoice))
            .route("/{id}/snapshot", web::get().to(get_snapshot))
            .route("/{id}/orders", web::post().to(create_order)),
    );
}
