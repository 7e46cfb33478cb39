// LineItem: one billable component of an invoice (tuition, transport, ...)
//
// Line items are derived from fee-plan configuration on every read; the
// ledger never persists them. An amount is either a real decimal or absent,
// never a stand-in zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Description used for the display-only line shown when nothing resolves
pub const FEES_DUE_DESCRIPTION: &str = "Fees Due";

/// Where a resolved line item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemSource {
    /// Assignment row linked to the invoice itself
    InvoiceAssignment,
    /// Assignment row linked to the invoice's student
    StudentAssignment,
    /// Component of a plan reached through an assignment
    PlanComponent,
    /// Concession recorded on the assignment, shown as a negative line
    Concession,
    /// Component of the only fee plan in the system
    GlobalPlan,
    /// Display-only placeholder, never persisted
    Synthetic,
}

/// A single billable component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Id of the source row (assignment or plan component), absent for synthetic lines
    pub id: Option<i64>,

    pub description: String,

    /// Absent when the source row carries no amount
    pub amount: Option<Decimal>,

    pub source: LineItemSource,
}

impl LineItem {
    pub fn new(
        id: Option<i64>,
        description: impl Into<String>,
        amount: Option<Decimal>,
        source: LineItemSource,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            amount,
            source,
        }
    }

    /// The single display line used when no items resolve
    pub fn fees_due(amount_due: Decimal) -> Self {
        Self::new(
            None,
            FEES_DUE_DESCRIPTION,
            Some(amount_due),
            LineItemSource::Synthetic,
        )
    }

    pub fn has_amount(&self) -> bool {
        self.amount.is_some()
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == LineItemSource::Synthetic
    }
}

/// True when at least one item carries a real amount
pub fn any_amount_bearing(items: &[LineItem]) -> bool {
    items.iter().any(LineItem::has_amount)
}

/// Sum of the amounts present; absent amounts contribute nothing
pub fn sum_amounts(items: &[LineItem]) -> Decimal {
    items.iter().filter_map(|item| item.amount).sum()
}
