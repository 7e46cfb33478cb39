use async_trait::async_trait;
use sqlx::MySqlPool;

use super::models::{FeeAssignment, FeePlan, PlanComponent};
use crate::core::Result;

/// Read access to fee-plan configuration owned outside the ledger
#[async_trait]
pub trait FeePlanRepository: Send + Sync {
    async fn assignments_for_invoice(&self, invoice_id: i64) -> Result<Vec<FeeAssignment>>;

    async fn assignments_for_student(&self, student_id: i64) -> Result<Vec<FeeAssignment>>;

    async fn components_for_plan(&self, fee_plan_id: i64) -> Result<Vec<PlanComponent>>;

    async fn list_plans(&self) -> Result<Vec<FeePlan>>;
}

pub struct MySqlFeePlanRepository {
    pool: MySqlPool,
}

impl MySqlFeePlanRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_ASSIGNMENT: &str = r#"
    SELECT id, student_id, fee_plan_id, invoice_id, description, amount, concession, note
    FROM fee_assignments
"#;

#[async_trait]
impl FeePlanRepository for MySqlFeePlanRepository {
    async fn assignments_for_invoice(&self, invoice_id: i64) -> Result<Vec<FeeAssignment>> {
        let rows = sqlx::query_as::<_, FeeAssignment>(&format!(
            "{} WHERE invoice_id = ? ORDER BY id",
            SELECT_ASSIGNMENT
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn assignments_for_student(&self, student_id: i64) -> Result<Vec<FeeAssignment>> {
        let rows = sqlx::query_as::<_, FeeAssignment>(&format!(
            "{} WHERE student_id = ? ORDER BY id",
            SELECT_ASSIGNMENT
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn components_for_plan(&self, fee_plan_id: i64) -> Result<Vec<PlanComponent>> {
        let rows = sqlx::query_as::<_, PlanComponent>(
            r#"
            SELECT fpc.id, fpc.fee_plan_id, fc.name, fc.description, fpc.amount
            FROM fee_plan_components fpc
            JOIN fee_components fc ON fc.id = fpc.fee_component_id
            WHERE fpc.fee_plan_id = ?
            ORDER BY fpc.id
            "#,
        )
        .bind(fee_plan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_plans(&self) -> Result<Vec<FeePlan>> {
        let rows = sqlx::query_as::<_, FeePlan>(
            "SELECT id, name, academic_year, frequency FROM fee_plans ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
