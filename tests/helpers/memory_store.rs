// In-memory store implementing every repository trait
//
// A std Mutex guards the state and is never held across an await. Lookups on
// a natural key yield after reading, like a database round trip, so callers
// joined on one task interleave between their existence check and insert.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use fee_ledger::core::{AppError, InsertOutcome, Result};
use fee_ledger::modules::fee_plans::{FeeAssignment, FeePlan, FeePlanRepository, PlanComponent};
use fee_ledger::modules::invoices::models::{Invoice, InvoiceStatus, NewInvoice};
use fee_ledger::modules::invoices::repositories::InvoiceRepository;
use fee_ledger::modules::payments::models::{NewPayment, Payment};
use fee_ledger::modules::payments::PaymentRepository;
use fee_ledger::modules::receipts::{NewReceipt, Receipt, ReceiptRepository};
use fee_ledger::modules::students::{Student, StudentRepository};
use fee_ledger::modules::users::models::SYSTEM_ADMIN_EMAIL;
use fee_ledger::modules::users::{Role, User, UserRepository};

#[derive(Default)]
struct State {
    next_id: i64,
    students: Vec<Student>,
    users: Vec<User>,
    plans: Vec<FeePlan>,
    components: Vec<PlanComponent>,
    assignments: Vec<FeeAssignment>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
    receipts: Vec<Receipt>,
    insert_attempts: Vec<&'static str>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().expect("memory store poisoned");
        f(&mut state)
    }

    async fn lookup<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let found = self.with(f);
        tokio::task::yield_now().await;
        found
    }

    /// How many inserts were attempted against a table, including lost races
    pub fn insert_attempts(&self, table: &str) -> usize {
        self.with(|s| s.insert_attempts.iter().filter(|t| **t == table).count())
    }

    // Factory methods

    pub fn add_student(&self, name: &str, guardian_email: Option<&str>) -> Student {
        self.with(|s| {
            let id = s.next_id();
            let student = Student {
                id,
                name: name.to_string(),
                admission_no: Some(format!("ADM-{}", id)),
                guardian_email: guardian_email.map(String::from),
                created_at: Some(Utc::now()),
            };
            s.students.push(student.clone());
            student
        })
    }

    pub fn add_user(&self, email: &str, role: Role, is_active: bool) -> User {
        self.with(|s| {
            let id = s.next_id();
            let user = User {
                id,
                email: email.to_string(),
                role,
                is_active,
                created_at: Utc.timestamp_opt(1_700_000_000 + id, 0).single(),
            };
            s.users.push(user.clone());
            user
        })
    }

    pub fn add_plan(&self, name: &str) -> FeePlan {
        self.with(|s| {
            let plan = FeePlan {
                id: s.next_id(),
                name: name.to_string(),
                academic_year: "2025-26".to_string(),
                frequency: "annual".to_string(),
            };
            s.plans.push(plan.clone());
            plan
        })
    }

    pub fn add_component(&self, plan_id: i64, name: &str, amount: Option<Decimal>) -> PlanComponent {
        self.with(|s| {
            let component = PlanComponent {
                id: s.next_id(),
                fee_plan_id: plan_id,
                name: name.to_string(),
                description: None,
                amount,
            };
            s.components.push(component.clone());
            component
        })
    }

    /// Plan link for a student, optionally with a concession
    pub fn assign_plan(&self, student_id: i64, plan_id: i64, concession: Decimal) -> FeeAssignment {
        self.add_assignment(FeeAssignment {
            id: 0,
            student_id,
            fee_plan_id: Some(plan_id),
            invoice_id: None,
            description: None,
            amount: None,
            concession,
            note: None,
        })
    }

    /// Direct charge on a student, optionally tied to one invoice
    pub fn add_charge(
        &self,
        student_id: i64,
        invoice_id: Option<i64>,
        description: &str,
        amount: Option<Decimal>,
    ) -> FeeAssignment {
        self.add_assignment(FeeAssignment {
            id: 0,
            student_id,
            fee_plan_id: None,
            invoice_id,
            description: Some(description.to_string()),
            amount,
            concession: Decimal::ZERO,
            note: None,
        })
    }

    pub fn add_assignment(&self, assignment: FeeAssignment) -> FeeAssignment {
        self.with(|s| {
            let assignment = FeeAssignment {
                id: s.next_id(),
                ..assignment
            };
            s.assignments.push(assignment.clone());
            assignment
        })
    }

    /// Insert a payment row directly, bypassing the recorder
    pub fn insert_payment(&self, payment: NewPayment) -> Payment {
        self.with(|s| {
            let payment = Payment {
                id: s.next_id(),
                invoice_id: payment.invoice_id,
                provider: payment.provider,
                provider_txn_id: payment.provider_txn_id,
                amount: payment.amount,
                status: payment.status,
                idempotency_key: payment.idempotency_key,
                created_at: Some(Utc::now()),
            };
            s.payments.push(payment.clone());
            payment
        })
    }

    // Inspection

    pub fn invoices(&self) -> Vec<Invoice> {
        self.with(|s| s.invoices.clone())
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.with(|s| s.payments.clone())
    }

    pub fn receipts(&self) -> Vec<Receipt> {
        self.with(|s| s.receipts.clone())
    }

    pub fn users(&self) -> Vec<User> {
        self.with(|s| s.users.clone())
    }

    pub fn invoice(&self, id: i64) -> Invoice {
        self.with(|s| s.invoices.iter().find(|i| i.id == id).cloned())
            .expect("invoice exists")
    }
}

#[async_trait]
impl StudentRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Student>> {
        Ok(self.with(|s| s.students.iter().find(|st| st.id == id).cloned()))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.with(|s| s.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn find_earliest_with_roles(&self, roles: &[Role]) -> Result<Option<User>> {
        Ok(self.with(|s| {
            s.users
                .iter()
                .filter(|u| u.is_active && roles.contains(&u.role))
                .min_by_key(|u| (u.created_at, u.id))
                .cloned()
        }))
    }

    async fn ensure_system_admin(&self) -> Result<InsertOutcome<User>> {
        Ok(self.with(|s| {
            if let Some(existing) = s.users.iter().find(|u| u.email == SYSTEM_ADMIN_EMAIL) {
                return InsertOutcome::Existing(existing.clone());
            }
            let user = User {
                id: s.next_id(),
                email: SYSTEM_ADMIN_EMAIL.to_string(),
                role: Role::Admin,
                is_active: true,
                created_at: Some(Utc::now()),
            };
            s.users.push(user.clone());
            InsertOutcome::Created(user)
        }))
    }
}

#[async_trait]
impl FeePlanRepository for MemoryStore {
    async fn assignments_for_invoice(&self, invoice_id: i64) -> Result<Vec<FeeAssignment>> {
        Ok(self.with(|s| {
            s.assignments
                .iter()
                .filter(|a| a.invoice_id == Some(invoice_id))
                .cloned()
                .collect()
        }))
    }

    async fn assignments_for_student(&self, student_id: i64) -> Result<Vec<FeeAssignment>> {
        Ok(self.with(|s| {
            s.assignments
                .iter()
                .filter(|a| a.student_id == student_id)
                .cloned()
                .collect()
        }))
    }

    async fn components_for_plan(&self, fee_plan_id: i64) -> Result<Vec<PlanComponent>> {
        Ok(self.with(|s| {
            s.components
                .iter()
                .filter(|c| c.fee_plan_id == fee_plan_id)
                .cloned()
                .collect()
        }))
    }

    async fn list_plans(&self) -> Result<Vec<FeePlan>> {
        Ok(self.with(|s| s.plans.clone()))
    }
}

#[async_trait]
impl InvoiceRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        Ok(self.with(|s| s.invoices.iter().find(|i| i.id == id).cloned()))
    }

    async fn find_by_invoice_no(&self, invoice_no: &str) -> Result<Option<Invoice>> {
        Ok(self
            .lookup(|s| s.invoices.iter().find(|i| i.invoice_no == invoice_no).cloned())
            .await)
    }

    async fn create_settled(
        &self,
        invoice: &NewInvoice,
        amount_due: Decimal,
    ) -> Result<InsertOutcome<Invoice>> {
        Ok(self.with(|s| {
            s.insert_attempts.push("invoices");
            if let Some(existing) = s.invoices.iter().find(|i| i.invoice_no == invoice.invoice_no) {
                return InsertOutcome::Existing(existing.clone());
            }
            let row = Invoice {
                id: s.next_id(),
                invoice_no: invoice.invoice_no.clone(),
                student_id: invoice.student_id,
                period: invoice.period.clone(),
                amount_due,
                due_date: invoice.due_date,
                status: InvoiceStatus::Pending,
                created_at: Some(Utc::now()),
            };
            s.invoices.push(row.clone());
            InsertOutcome::Created(row)
        }))
    }

    async fn update_status(&self, id: i64, status: InvoiceStatus) -> Result<()> {
        self.with(|s| match s.invoices.iter_mut().find(|i| i.id == id) {
            Some(invoice) => {
                invoice.status = status;
                Ok(())
            }
            None => Err(AppError::not_found(format!("Invoice {}", id))),
        })
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Payment>> {
        Ok(self.with(|s| s.payments.iter().find(|p| p.id == id).cloned()))
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Payment>> {
        Ok(self
            .lookup(|s| {
                s.payments
                    .iter()
                    .find(|p| p.idempotency_key.as_deref() == Some(key))
                    .cloned()
            })
            .await)
    }

    async fn find_by_provider_txn(
        &self,
        provider: &str,
        provider_txn_id: &str,
    ) -> Result<Option<Payment>> {
        Ok(self
            .lookup(|s| {
                s.payments
                    .iter()
                    .find(|p| p.provider == provider && p.provider_txn_id == provider_txn_id)
                    .cloned()
            })
            .await)
    }

    async fn insert_or_get(&self, payment: &NewPayment) -> Result<InsertOutcome<Payment>> {
        Ok(self.with(|s| {
            s.insert_attempts.push("payments");
            let existing = s.payments.iter().find(|p| {
                (payment.idempotency_key.is_some() && p.idempotency_key == payment.idempotency_key)
                    || (p.provider == payment.provider
                        && p.provider_txn_id == payment.provider_txn_id)
            });
            if let Some(existing) = existing {
                return InsertOutcome::Existing(existing.clone());
            }

            let row = Payment {
                id: s.next_id(),
                invoice_id: payment.invoice_id,
                provider: payment.provider.clone(),
                provider_txn_id: payment.provider_txn_id.clone(),
                amount: payment.amount,
                status: payment.status,
                idempotency_key: payment.idempotency_key.clone(),
                created_at: Some(Utc::now()),
            };
            s.payments.push(row.clone());
            InsertOutcome::Created(row)
        }))
    }

    async fn captured_total(&self, invoice_id: i64) -> Result<Decimal> {
        Ok(self.with(|s| {
            s.payments
                .iter()
                .filter(|p| p.invoice_id == invoice_id && p.status.is_captured())
                .map(|p| p.amount)
                .sum()
        }))
    }
}

#[async_trait]
impl ReceiptRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Receipt>> {
        Ok(self.with(|s| s.receipts.iter().find(|r| r.id == id).cloned()))
    }

    async fn find_by_payment_id(&self, payment_id: i64) -> Result<Option<Receipt>> {
        Ok(self
            .lookup(|s| s.receipts.iter().find(|r| r.payment_id == payment_id).cloned())
            .await)
    }

    async fn insert_or_get(&self, receipt: &NewReceipt) -> Result<InsertOutcome<Receipt>> {
        self.with(|s| {
            s.insert_attempts.push("receipts");
            if let Some(existing) = s.receipts.iter().find(|r| r.payment_id == receipt.payment_id) {
                return Ok(InsertOutcome::Existing(existing.clone()));
            }
            if s.receipts.iter().any(|r| r.receipt_no == receipt.receipt_no) {
                return Err(AppError::conflict(format!(
                    "Receipt number {} is already in use",
                    receipt.receipt_no
                )));
            }

            let row = Receipt {
                id: s.next_id(),
                payment_id: receipt.payment_id,
                receipt_no: receipt.receipt_no.clone(),
                pdf_path: receipt.pdf_path.clone(),
                created_by: receipt.created_by,
                created_at: Some(Utc::now()),
            };
            s.receipts.push(row.clone());
            Ok(InsertOutcome::Created(row))
        })
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.with(|s| s.receipts.retain(|r| r.id != id));
        Ok(())
    }
}
