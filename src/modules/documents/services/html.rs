// Minimal HTML layout fed to the PDF converter

use rust_decimal::Decimal;

use crate::modules::documents::models::{DocumentContext, InvoiceDocument, ReceiptDocument};
use crate::modules::invoices::models::LineItem;

pub fn render_html(context: &DocumentContext) -> String {
    match context {
        DocumentContext::Invoice(invoice) => invoice_html(invoice),
        DocumentContext::Receipt(receipt) => receipt_html(receipt),
    }
}

fn invoice_html(doc: &InvoiceDocument) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>Invoice {}</h1>", escape(&doc.invoice_no)));
    body.push_str(&header(doc));
    body.push_str(&items_table(&doc.items, &doc.currency));
    body.push_str(&totals(
        &doc.currency,
        &[
            ("Items total", doc.items_total),
            ("Total due", doc.total_due),
            ("Paid", doc.paid_amount),
            ("Balance", doc.balance),
        ],
    ));
    page(&format!("Invoice {}", doc.invoice_no), &body)
}

fn receipt_html(doc: &ReceiptDocument) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>Receipt {}</h1>", escape(&doc.receipt_no)));
    body.push_str(&format!(
        "<p>Against invoice {} &middot; {} {}</p>",
        escape(&doc.invoice.invoice_no),
        escape(&doc.provider),
        escape(&doc.provider_txn_id)
    ));
    body.push_str(&header(&doc.invoice));
    body.push_str(&format!(
        "<p class=\"amount\">Amount received: {} {}</p>",
        escape(&doc.invoice.currency),
        doc.amount.round_dp(2)
    ));
    body.push_str(&items_table(&doc.items, &doc.invoice.currency));
    body.push_str(&totals(
        &doc.invoice.currency,
        &[
            ("Items total", doc.items_total),
            ("Total due", doc.total_due),
            ("Paid to date", doc.paid_amount),
            ("Balance", doc.balance),
        ],
    ));
    page(&format!("Receipt {}", doc.receipt_no), &body)
}

fn header(doc: &InvoiceDocument) -> String {
    format!(
        "<p>{}{} &middot; Period {} &middot; Due {}</p>",
        escape(&doc.student_name),
        doc.admission_no
            .as_deref()
            .map(|no| format!(" ({})", escape(no)))
            .unwrap_or_default(),
        escape(&doc.period),
        doc.due_date.format("%Y-%m-%d")
    )
}

fn items_table(items: &[LineItem], currency: &str) -> String {
    let rows: String = items
        .iter()
        .map(|item| {
            let amount = item
                .amount
                .map(|a| format!("{} {}", escape(currency), a.round_dp(2)))
                .unwrap_or_else(|| "&ndash;".to_string());
            format!(
                "<tr><td>{}</td><td class=\"num\">{}</td></tr>",
                escape(&item.description),
                amount
            )
        })
        .collect();

    format!(
        "<table><thead><tr><th>Description</th><th>Amount</th></tr></thead><tbody>{}</tbody></table>",
        rows
    )
}

fn totals(currency: &str, rows: &[(&str, Decimal)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                "<tr><th>{}</th><td class=\"num\">{} {}</td></tr>",
                label,
                escape(currency),
                value.round_dp(2)
            )
        })
        .collect();
    format!("<table class=\"totals\">{}</table>", rows)
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>body{{font-family:sans-serif}}table{{width:100%;border-collapse:collapse}}\
         td,th{{padding:4px;border-bottom:1px solid #ddd;text-align:left}}.num{{text-align:right}}</style>\
         </head><body>{}</body></html>",
        escape(title),
        body
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
