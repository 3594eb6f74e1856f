use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use sensorgate_types::User;

use super::UserRepository;

pub type DbPool = Pool<Postgres>;

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    banned: bool,
    billing_lockout: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            banned: row.banned,
            billing_lockout: row.billing_lockout,
        }
    }
}

/// PostgreSQL-backed user repository.
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_all_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, banned, billing_lockout
            FROM users
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, banned, billing_lockout
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user")?;

        Ok(row.map(User::from))
    }
}
