use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Email of the user synthesized when no admin/clerk exists yet
pub const SYSTEM_ADMIN_EMAIL: &str = "system-admin@fee-ledger.local";

/// Role assigned to a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Clerk,
    Accountant,
    Student,
    Parent,
}

/// Operation a role may be allowed to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    CreateReceipt,
    ManageInvoices,
    ViewOwnReceipts,
}

impl Role {
    /// Capability policy, kept in one place instead of string comparisons at call sites
    pub fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::CreateReceipt => matches!(self, Role::Admin | Role::Clerk),
            Capability::ManageInvoices => {
                matches!(self, Role::Admin | Role::Clerk | Role::Accountant)
            }
            Capability::ViewOwnReceipts => true,
        }
    }

    /// Roles holding the capability, in the order they are preferred as fallback actors
    pub fn with_capability(capability: Capability) -> Vec<Role> {
        [
            Role::Admin,
            Role::Clerk,
            Role::Accountant,
            Role::Student,
            Role::Parent,
        ]
        .into_iter()
        .filter(|role| role.has_capability(capability))
        .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Clerk => write!(f, "clerk"),
            Role::Accountant => write!(f, "accountant"),
            Role::Student => write!(f, "student"),
            Role::Parent => write!(f, "parent"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "clerk" => Ok(Role::Clerk),
            "accountant" => Ok(Role::Accountant),
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A staff or portal user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.is_active && self.role.has_capability(capability)
    }
}
