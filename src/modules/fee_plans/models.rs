use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A fee plan, e.g. "Grade 5 Annual 2025-26"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FeePlan {
    pub id: i64,
    pub name: String,
    pub academic_year: String,
    /// `monthly`, `quarterly`, `annual`, ...
    pub frequency: String,
}

/// A plan's component joined with its fee component name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PlanComponent {
    /// fee_plan_components.id
    pub id: i64,
    pub fee_plan_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
}

/// Links a student (and optionally a single invoice) to a plan or a direct charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FeeAssignment {
    pub id: i64,
    pub student_id: i64,
    pub fee_plan_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub concession: Decimal,
    pub note: Option<String>,
}

impl FeeAssignment {
    /// A row that bills something itself rather than only pointing at a plan
    pub fn is_direct_charge(&self) -> bool {
        self.amount.is_some() || self.description.is_some()
    }

    pub fn has_concession(&self) -> bool {
        self.concession > Decimal::ZERO
    }

    /// Whether the row applies to the given invoice (unlinked rows apply to every invoice)
    pub fn applies_to_invoice(&self, invoice_id: Option<i64>) -> bool {
        match (self.invoice_id, invoice_id) {
            (None, _) => true,
            (Some(linked), Some(target)) => linked == target,
            (Some(_), None) => false,
        }
    }
}
