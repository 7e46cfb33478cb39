use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A student that invoices are raised against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub admission_no: Option<String>,
    /// Recipient for payment notifications
    pub guardian_email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Student {
    /// Name printed on invoices and receipts
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        match &self.admission_no {
            Some(no) if !no.trim().is_empty() => no.trim().to_string(),
            _ => format!("Student #{}", self.id),
        }
    }
}
