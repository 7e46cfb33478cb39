// Integration Tests: end-to-end instalment flow
//
// Invoice for Tuition 1000 + Transport 500, settled by two gateway webhooks
// of 700 and 800, each producing its own receipt.

#[path = "../helpers/mod.rs"]
mod helpers;

use fee_ledger::modules::documents::DocumentContext;
use fee_ledger::modules::invoices::InvoiceStatus;
use fee_ledger::modules::payments::{PaymentStatus, WebhookOutcome};
use helpers::*;
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn test_two_instalments_settle_invoice() {
    let ctx = TestContext::new();
    let student_id = ctx.student_on_standard_plan(Some("parent@example.com"));

    let invoice = ctx
        .services
        .invoices
        .generate_invoice(invoice_request(student_id, "2025-T1"))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(invoice.amount_due, dec!(1500));

    let order = ctx
        .services
        .payments
        .create_payment_order(invoice.id, None)
        .await
        .unwrap();
    assert_eq!(order.amount_minor, 150000);

    let (body, signature) = signed_webhook(&json!({
        "invoice_id": invoice.id,
        "amount": "700.00",
        "provider_txn_id": "pay_A",
    }));
    let first = ctx
        .services
        .payments
        .handle_webhook(&body, &signature)
        .await
        .unwrap();
    assert!(matches!(
        first,
        WebhookOutcome::Ok {
            invoice_status: InvoiceStatus::Pending,
            ..
        }
    ));

    // gateway retry of the first event
    let replay = ctx
        .services
        .payments
        .handle_webhook(&body, &signature)
        .await
        .unwrap();
    assert!(replay.is_ignored());

    let (body, signature) = signed_webhook(&json!({
        "invoice_id": invoice.id,
        "amount": "800.00",
        "provider_txn_id": "pay_B",
    }));
    let second = ctx
        .services
        .payments
        .handle_webhook(&body, &signature)
        .await
        .unwrap();
    assert!(matches!(
        second,
        WebhookOutcome::Ok {
            invoice_status: InvoiceStatus::Paid,
            ..
        }
    ));

    let snapshot = ctx.services.reconciliation.build(invoice.id).await.unwrap();
    assert_eq!(snapshot.items_total, dec!(1500));
    assert_eq!(snapshot.paid_amount, dec!(1500));
    assert_eq!(snapshot.balance, dec!(0));
    assert!(snapshot.is_settled());

    assert_eq!(ctx.store.payments().len(), 2);
    assert_eq!(ctx.store.receipts().len(), 2);
    assert_eq!(ctx.messenger.sent().len(), 2);

    let receipts: Vec<_> = ctx
        .renderer
        .rendered()
        .into_iter()
        .filter_map(|(context, _)| match context {
            DocumentContext::Receipt(receipt) => Some(receipt),
            DocumentContext::Invoice(_) => None,
        })
        .collect();
    assert_eq!(receipts.len(), 2);
    assert_eq!(
        (receipts[0].amount, receipts[0].paid_amount, receipts[0].balance),
        (dec!(700), dec!(700), dec!(800))
    );
    assert_eq!(
        (receipts[1].amount, receipts[1].paid_amount, receipts[1].balance),
        (dec!(800), dec!(1500), dec!(0))
    );
    assert_ne!(receipts[0].receipt_no, receipts[1].receipt_no);
}

#[tokio::test]
async fn test_overpayment_reports_negative_balance() {
    let ctx = TestContext::new();
    let student_id = ctx.student_on_standard_plan(None);
    let invoice = ctx
        .services
        .invoices
        .generate_invoice(invoice_request(student_id, "2025-T1"))
        .await
        .unwrap()
        .into_inner();

    ctx.services
        .payments
        .create_payment(invoice.id, "cash", "CASH-1", dec!(1600), PaymentStatus::Captured, None)
        .await
        .unwrap();

    let snapshot = ctx.services.reconciliation.build(invoice.id).await.unwrap();
    assert_eq!(snapshot.balance, dec!(-100));
    assert_eq!(ctx.store.invoice(invoice.id).status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn test_invoice_rerender_after_payments() {
    let ctx = TestContext::new();
    let student_id = ctx.student_on_standard_plan(None);
    let ledger = &ctx.services.invoices;

    let invoice = ledger
        .generate_invoice(invoice_request(student_id, "2025-T1"))
        .await
        .unwrap()
        .into_inner();
    ctx.services
        .payments
        .create_payment(invoice.id, "cash", "CASH-1", dec!(700), PaymentStatus::Captured, None)
        .await
        .unwrap();

    // replaying the creation request refreshes the document only
    ledger
        .generate_invoice(invoice_request(student_id, "2025-T1"))
        .await
        .unwrap();

    let (context, _) = ctx.renderer.last().unwrap();
    let document = context.as_invoice().unwrap();
    assert_eq!(document.paid_amount, dec!(700));
    assert_eq!(document.balance, dec!(800));
    assert_eq!(ctx.store.invoice(invoice.id).amount_due, dec!(1500));
}
