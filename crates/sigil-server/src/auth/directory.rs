//! User lookup for the login flow.

use async_trait::async_trait;
use sigil_adapter_pg::PgTokenStore;
use uuid::Uuid;

/// A user row, as much of it as login needs.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// Read/write access to the principal directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;

    async fn user_count(&self) -> anyhow::Result<i64>;

    async fn insert_user(&self, email: &str, password_hash: &str) -> anyhow::Result<Uuid>;
}

#[async_trait]
impl UserDirectory for PgTokenStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let row: Option<(Uuid, String, String)> =
            sqlx::query_as("select id, email, password_hash from users where email = $1")
                .bind(email)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|(id, email, password_hash)| UserRecord {
            id,
            email,
            password_hash,
        }))
    }

    async fn user_count(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("select count(1) from users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    async fn insert_user(&self, email: &str, password_hash: &str) -> anyhow::Result<Uuid> {
        let (id,): (Uuid,) =
            sqlx::query_as("insert into users (email, password_hash) values ($1, $2) returning id")
                .bind(email)
                .bind(password_hash)
                .fetch_one(self.pool())
                .await?;
        Ok(id)
    }
}
