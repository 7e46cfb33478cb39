use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::Result;
use crate::modules::fee_plans::models::{FeeAssignment, PlanComponent};
use crate::modules::fee_plans::repository::FeePlanRepository;
use crate::modules::invoices::models::{any_amount_bearing, Invoice, LineItem, LineItemSource};

/// What to resolve billable items for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveTarget {
    pub invoice_id: Option<i64>,
    pub student_id: i64,
}

impl ResolveTarget {
    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self {
            invoice_id: Some(invoice.id),
            student_id: invoice.student_id,
        }
    }

    pub fn for_student(student_id: i64) -> Self {
        Self {
            invoice_id: None,
            student_id,
        }
    }
}

/// Which strategy produced the items, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    InvoiceAssignments,
    StudentAssignments,
    PlanComponents,
    GlobalPlan,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub strategy: ResolutionStrategy,
    pub items: Vec<LineItem>,
}

impl Resolution {
    fn unresolved() -> Self {
        Self {
            strategy: ResolutionStrategy::Unresolved,
            items: Vec::new(),
        }
    }
}

/// Resolves the billable components of an invoice from fee-plan configuration.
///
/// Strategies are tried in order and the first one yielding at least one
/// amount-bearing item wins:
/// 1. direct charges on assignments linked to the invoice
/// 2. direct charges on the student's assignments
/// 3. components of the plans those assignments point at (plus concessions)
/// 4. components of the only fee plan in the system
///
/// Anything else resolves to an empty list. Callers that need something to
/// display substitute [`LineItem::fees_due`], which is never persisted.
pub struct LineItemResolver {
    fee_plans: Arc<dyn FeePlanRepository>,
}

impl LineItemResolver {
    pub fn new(fee_plans: Arc<dyn FeePlanRepository>) -> Self {
        Self { fee_plans }
    }

    pub async fn resolve(&self, target: ResolveTarget) -> Result<Vec<LineItem>> {
        Ok(self.resolve_with_strategy(target).await?.items)
    }

    pub async fn resolve_with_strategy(&self, target: ResolveTarget) -> Result<Resolution> {
        let invoice_assignments = match target.invoice_id {
            Some(invoice_id) => self.fee_plans.assignments_for_invoice(invoice_id).await?,
            None => Vec::new(),
        };

        let items = direct_charges(&invoice_assignments, LineItemSource::InvoiceAssignment);
        if any_amount_bearing(&items) {
            return Ok(Resolution {
                strategy: ResolutionStrategy::InvoiceAssignments,
                items,
            });
        }

        let student_assignments: Vec<FeeAssignment> = self
            .fee_plans
            .assignments_for_student(target.student_id)
            .await?
            .into_iter()
            .filter(|a| a.applies_to_invoice(target.invoice_id))
            .collect();

        let items = direct_charges(&student_assignments, LineItemSource::StudentAssignment);
        if any_amount_bearing(&items) {
            return Ok(Resolution {
                strategy: ResolutionStrategy::StudentAssignments,
                items,
            });
        }

        // Plans linked to the invoice take precedence over the student's general plans
        let plan_links = if invoice_assignments.iter().any(|a| a.fee_plan_id.is_some()) {
            &invoice_assignments
        } else {
            &student_assignments
        };

        let items = self.plan_component_items(plan_links).await?;
        if any_amount_bearing(&items) {
            return Ok(Resolution {
                strategy: ResolutionStrategy::PlanComponents,
                items,
            });
        }

        let items = self.global_plan_items().await?;
        if any_amount_bearing(&items) {
            tracing::debug!(
                student_id = target.student_id,
                "Resolved line items from the single global fee plan"
            );
            return Ok(Resolution {
                strategy: ResolutionStrategy::GlobalPlan,
                items,
            });
        }

        tracing::debug!(
            student_id = target.student_id,
            invoice_id = ?target.invoice_id,
            "No amount-bearing line items resolved"
        );
        Ok(Resolution::unresolved())
    }

    async fn plan_component_items(&self, assignments: &[FeeAssignment]) -> Result<Vec<LineItem>> {
        let mut plan_ids: Vec<i64> = Vec::new();
        for plan_id in assignments.iter().filter_map(|a| a.fee_plan_id) {
            if !plan_ids.contains(&plan_id) {
                plan_ids.push(plan_id);
            }
        }

        let mut items = Vec::new();
        for plan_id in plan_ids {
            let components = self.fee_plans.components_for_plan(plan_id).await?;
            let component_items = component_lines(&components, LineItemSource::PlanComponent);

            // Concessions only apply against a plan that actually bills something
            if !any_amount_bearing(&component_items) {
                continue;
            }
            items.extend(component_items);

            let concession: Decimal = assignments
                .iter()
                .filter(|a| a.fee_plan_id == Some(plan_id) && a.has_concession())
                .map(|a| a.concession)
                .sum();

            if concession > Decimal::ZERO {
                items.push(LineItem::new(
                    None,
                    "Concession",
                    Some(-concession),
                    LineItemSource::Concession,
                ));
            }
        }

        Ok(items)
    }

    async fn global_plan_items(&self) -> Result<Vec<LineItem>> {
        let plans = self.fee_plans.list_plans().await?;

        match plans.as_slice() {
            [plan] => {
                let components = self.fee_plans.components_for_plan(plan.id).await?;
                Ok(component_lines(&components, LineItemSource::GlobalPlan))
            }
            [] => Ok(Vec::new()),
            _ => {
                tracing::debug!(
                    plan_count = plans.len(),
                    "Multiple fee plans and no assignment, declining global fallback"
                );
                Ok(Vec::new())
            }
        }
    }
}

fn direct_charges(assignments: &[FeeAssignment], source: LineItemSource) -> Vec<LineItem> {
    assignments
        .iter()
        .filter(|a| a.is_direct_charge())
        .map(|a| {
            let description = a
                .description
                .clone()
                .or_else(|| a.note.clone())
                .unwrap_or_else(|| format!("Fee assignment #{}", a.id));
            LineItem::new(Some(a.id), description, a.amount, source)
        })
        .collect()
}

fn component_lines(components: &[PlanComponent], source: LineItemSource) -> Vec<LineItem> {
    components
        .iter()
        .map(|c| LineItem::new(Some(c.id), c.name.clone(), c.amount, source))
        .collect()
}
