// Integration Tests: ReceiptIssuer
//
// One receipt per captured payment, actor resolution, cumulative render
// context and the compensating delete on render failure.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::path::PathBuf;

use fee_ledger::core::AppError;
use fee_ledger::modules::invoices::Invoice;
use fee_ledger::modules::payments::{Payment, PaymentStatus};
use fee_ledger::modules::users::models::SYSTEM_ADMIN_EMAIL;
use fee_ledger::modules::users::Role;
use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn standard_invoice(ctx: &TestContext) -> Invoice {
    let student_id = ctx.student_on_standard_plan(None);
    ctx.services
        .invoices
        .generate_invoice(invoice_request(student_id, "2025-T1"))
        .await
        .unwrap()
        .into_inner()
}

async fn pay(ctx: &TestContext, invoice: &Invoice, txn: &str, amount: Decimal) -> Payment {
    ctx.services
        .payments
        .create_payment(invoice.id, "razorpay", txn, amount, PaymentStatus::Captured, None)
        .await
        .unwrap()
        .into_inner()
}

#[tokio::test]
async fn test_one_receipt_per_payment() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    let issuer = &ctx.services.receipts;

    let first = issuer
        .create_receipt_and_render(payment.id, None, None)
        .await
        .unwrap();
    let second = issuer
        .create_receipt_and_render(payment.id, Some("REC-OTHER".to_string()), None)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.store.receipts().len(), 1);
    assert_eq!(
        PathBuf::from(&first.pdf_path),
        PathBuf::from(format!("data/receipts/{}.pdf", first.receipt_no))
    );
}

#[tokio::test]
async fn test_concurrent_issuance_creates_one_receipt() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    let issuer = &ctx.services.receipts;

    let (a, b) = tokio::join!(
        issuer.create_receipt_and_render(payment.id, None, None),
        issuer.create_receipt_and_render(payment.id, None, None),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(ctx.store.insert_attempts("receipts"), 2);
    assert_eq!(a, b);
    assert_eq!(ctx.store.receipts().len(), 1);
}

#[tokio::test]
async fn test_receipts_carry_cumulative_totals() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let issuer = &ctx.services.receipts;

    let p1 = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    issuer.create_receipt_and_render(p1.id, None, None).await.unwrap();
    let (first, _) = ctx.renderer.last().unwrap();
    let first = first.as_receipt().expect("receipt context").clone();

    let p2 = pay(&ctx, &invoice, "pay_002", dec!(800)).await;
    issuer.create_receipt_and_render(p2.id, None, None).await.unwrap();
    let (second, _) = ctx.renderer.last().unwrap();
    let second = second.as_receipt().expect("receipt context").clone();

    assert_eq!(first.amount, dec!(700));
    assert_eq!(first.paid_amount, dec!(700));
    assert_eq!(first.balance, dec!(800));
    assert_eq!(first.items_total, dec!(1500));

    assert_eq!(second.amount, dec!(800));
    assert_eq!(second.paid_amount, dec!(1500));
    assert_eq!(second.balance, dec!(0));
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.invoice.invoice_no, "2025-T1");
}

#[tokio::test]
async fn test_failed_payment_cannot_be_receipted() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = ctx
        .services
        .payments
        .create_payment(invoice.id, "razorpay", "pay_bad", dec!(700), PaymentStatus::Failed, None)
        .await
        .unwrap()
        .into_inner();

    let err = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::State(_)));
    assert!(ctx.store.receipts().is_empty());
}

#[tokio::test]
async fn test_unknown_payment() {
    let ctx = TestContext::new();

    let err = ctx
        .services
        .receipts
        .create_receipt_and_render(404, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_explicit_actor_needs_capability() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    let accountant = ctx.store.add_user("accounts@school.example", Role::Accountant, true);

    let err = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, None, Some(accountant.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, None, Some(9999))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    assert!(ctx.store.receipts().is_empty());
}

#[tokio::test]
async fn test_clerk_can_issue_receipts() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    let clerk = ctx.store.add_user("clerk@school.example", Role::Clerk, true);

    let receipt = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, Some("R-2025-0001".to_string()), Some(clerk.id))
        .await
        .unwrap();

    assert_eq!(receipt.created_by, clerk.id);
    assert_eq!(receipt.receipt_no, "R-2025-0001");
}

#[tokio::test]
async fn test_fallback_actor_is_earliest_admin_or_clerk() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;

    ctx.store.add_user("old-admin@school.example", Role::Admin, false);
    ctx.store.add_user("accounts@school.example", Role::Accountant, true);
    let clerk = ctx.store.add_user("clerk@school.example", Role::Clerk, true);
    ctx.store.add_user("admin@school.example", Role::Admin, true);

    let receipt = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, None, None)
        .await
        .unwrap();

    assert_eq!(receipt.created_by, clerk.id);
}

#[tokio::test]
async fn test_system_admin_synthesized_once() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let p1 = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    let p2 = pay(&ctx, &invoice, "pay_002", dec!(800)).await;

    let r1 = ctx
        .services
        .receipts
        .create_receipt_and_render(p1.id, None, None)
        .await
        .unwrap();
    let r2 = ctx
        .services
        .receipts
        .create_receipt_and_render(p2.id, None, None)
        .await
        .unwrap();

    let admins: Vec<_> = ctx
        .store
        .users()
        .into_iter()
        .filter(|u| u.email == SYSTEM_ADMIN_EMAIL)
        .collect();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].role, Role::Admin);
    assert_eq!(r1.created_by, admins[0].id);
    assert_eq!(r2.created_by, admins[0].id);
}

#[tokio::test]
async fn test_render_failure_removes_receipt() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    ctx.renderer.set_failing(true);

    let err = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Render(_)));
    assert!(ctx.store.receipts().is_empty());

    ctx.renderer.set_failing(false);
    let receipt = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, None, None)
        .await
        .unwrap();

    assert_eq!(ctx.store.receipts(), vec![receipt]);
}

#[tokio::test]
async fn test_receipt_no_in_use_conflicts() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let p1 = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    let p2 = pay(&ctx, &invoice, "pay_002", dec!(800)).await;

    ctx.services
        .receipts
        .create_receipt_and_render(p1.id, Some("R-1".to_string()), None)
        .await
        .unwrap();
    let err = ctx
        .services
        .receipts
        .create_receipt_and_render(p2.id, Some("R-1".to_string()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_unsafe_receipt_no_is_rejected() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;

    let err = ctx
        .services
        .receipts
        .create_receipt_and_render(payment.id, Some("../R-1".to_string()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_lookup_and_document_for_issued_receipt() {
    let ctx = TestContext::new();
    let invoice = standard_invoice(&ctx).await;
    let payment = pay(&ctx, &invoice, "pay_001", dec!(700)).await;
    let issuer = &ctx.services.receipts;

    let err = issuer.get_by_payment_id(payment.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let issued = issuer
        .create_receipt_and_render(payment.id, None, None)
        .await
        .unwrap();
    assert_eq!(issuer.get_by_payment_id(payment.id).await.unwrap(), issued);

    // a later instalment shows up in the recomputed context
    pay(&ctx, &invoice, "pay_002", dec!(300)).await;
    let document = issuer.receipt_document(issued.id).await.unwrap();
    assert_eq!(document.receipt_no, issued.receipt_no);
    assert_eq!(document.amount, dec!(700));
    assert_eq!(document.paid_amount, dec!(1000));
    assert_eq!(document.balance, dec!(500));
}
