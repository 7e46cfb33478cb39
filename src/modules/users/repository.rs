use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};

use super::models::{Role, User, SYSTEM_ADMIN_EMAIL};
use crate::core::error::is_unique_violation;
use crate::core::{AppError, InsertOutcome, Result};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Earliest created active user holding one of `roles`
    async fn find_earliest_with_roles(&self, roles: &[Role]) -> Result<Option<User>>;

    /// Insert-or-get the minimal system admin account
    async fn ensure_system_admin(&self) -> Result<InsertOutcome<User>>;
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    role: String,
    is_active: bool,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            email: row.email,
            role: row.role.parse().map_err(AppError::Internal)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, role, is_active, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, role, is_active, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_earliest_with_roles(&self, roles: &[Role]) -> Result<Option<User>> {
        if roles.is_empty() {
            return Ok(None);
        }

        let placeholders = vec!["?"; roles.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, email, role, is_active, created_at
            FROM users
            WHERE is_active = TRUE AND role IN ({})
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for role in roles {
            query = query.bind(role.to_string());
        }

        let row = query.fetch_optional(&self.pool).await?;
        row.map(User::try_from).transpose()
    }

    async fn ensure_system_admin(&self) -> Result<InsertOutcome<User>> {
        if let Some(existing) = self.find_by_email(SYSTEM_ADMIN_EMAIL).await? {
            return Ok(InsertOutcome::Existing(existing));
        }

        let inserted = sqlx::query("INSERT INTO users (email, role, is_active) VALUES (?, ?, TRUE)")
            .bind(SYSTEM_ADMIN_EMAIL)
            .bind(Role::Admin.to_string())
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {
                let user = self.find_by_email(SYSTEM_ADMIN_EMAIL).await?.ok_or_else(|| {
                    AppError::internal("System admin was created but not found")
                })?;
                tracing::warn!(user_id = user.id, "Synthesized system admin user");
                Ok(InsertOutcome::Created(user))
            }
            Err(e) if is_unique_violation(&e) => self
                .find_by_email(SYSTEM_ADMIN_EMAIL)
                .await?
                .map(InsertOutcome::Existing)
                .ok_or_else(|| AppError::conflict("System admin insert raced but row is missing")),
            Err(e) => Err(e.into()),
        }
    }
}
