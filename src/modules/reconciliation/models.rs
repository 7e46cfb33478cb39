use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::Currency;
use crate::modules::invoices::models::{any_amount_bearing, sum_amounts, LineItem};

/// Consistent view of an invoice's totals at one point in time.
///
/// `balance == total_due - paid_amount` always holds (after rounding). A
/// negative balance is an overpayment and is reported as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationSnapshot {
    pub invoice_id: i64,
    /// Resolved items; empty when nothing resolved
    pub items: Vec<LineItem>,
    pub items_total: Decimal,
    pub total_due: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
}

impl ReconciliationSnapshot {
    /// Derive the totals from resolved items, the settled amount and the captured sum
    pub fn compute(
        invoice_id: i64,
        items: Vec<LineItem>,
        amount_due: Option<Decimal>,
        paid_amount: Decimal,
        currency: &Currency,
    ) -> Self {
        let items_total = if any_amount_bearing(&items) {
            currency.round(sum_amounts(&items))
        } else {
            currency.round(amount_due.unwrap_or(Decimal::ZERO))
        };

        let total_due = amount_due.map(|a| currency.round(a)).unwrap_or(items_total);
        let paid_amount = currency.round(paid_amount);

        Self {
            invoice_id,
            items,
            items_total,
            total_due,
            paid_amount,
            balance: currency.round(total_due - paid_amount),
        }
    }

    /// Items for display: the resolved list, or a single "Fees Due" line
    pub fn display_items(&self) -> Vec<LineItem> {
        if any_amount_bearing(&self.items) {
            self.items.clone()
        } else {
            vec![LineItem::fees_due(self.total_due)]
        }
    }

    pub fn is_settled(&self) -> bool {
        self.paid_amount >= self.total_due
    }
}
