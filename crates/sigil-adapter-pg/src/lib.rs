//! # sigil-adapter-pg
//!
//! Postgres implementation of the Sigil store traits via sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sigil_core::ClientId;
use sigil_token::{AuthToken, IdentifierStore, TokenError, TokenStore};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Row};
use uuid::Uuid;

/// A [`TokenStore`] backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run the bundled schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IdentifierStore for PgTokenStore {
    async fn identifier_exists(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<bool, TokenError> {
        // identifiers cannot be bound as parameters
        let sql = format!(
            "select exists(select 1 from {} where {} = $1)",
            quote_ident(table),
            quote_ident(column),
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TokenError::Store(e.to_string()))?;
        row.try_get::<bool, _>(0)
            .map_err(|e| TokenError::Store(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn find_token(&self, token: &str) -> Result<AuthToken, TokenError> {
        let row: Option<AuthTokenRow> = sqlx::query_as(
            "select token, user_id, client_id, client_ip, user_agent, expires_at \
             from auth_tokens where token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TokenError::LookupFailed(e.to_string()))?;

        row.ok_or_else(|| TokenError::LookupFailed("token not found".to_string()))?
            .try_into()
    }

    async fn insert_token(&self, record: &AuthToken) -> Result<(), TokenError> {
        let result = sqlx::query(
            "insert into auth_tokens (token, user_id, client_id, client_ip, user_agent, expires_at) \
             values ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&record.token)
        .bind(record.user_id)
        .bind(record.client_id.as_i16())
        .bind(&record.client_ip)
        .bind(&record.user_agent)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(TokenError::DuplicateToken)
            }
            Err(e) => Err(TokenError::Store(e.to_string())),
        }
    }

    async fn update_context(&self, record: &AuthToken) -> Result<(), TokenError> {
        sqlx::query(
            "update auth_tokens set client_id = $1, client_ip = $2, user_agent = $3 \
             where token = $4",
        )
        .bind(record.client_id.as_i16())
        .bind(&record.client_ip)
        .bind(&record.user_agent)
        .bind(&record.token)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenError::Store(e.to_string()))?;
        Ok(())
    }
}

#[derive(FromRow)]
struct AuthTokenRow {
    token: String,
    user_id: Uuid,
    client_id: i16,
    client_ip: String,
    user_agent: String,
    expires_at: DateTime<Utc>,
}

impl TryFrom<AuthTokenRow> for AuthToken {
    type Error = TokenError;

    fn try_from(row: AuthTokenRow) -> Result<Self, Self::Error> {
        let client_id = ClientId::from_i16(row.client_id)
            .ok_or_else(|| TokenError::Store(format!("unknown client id {}", row.client_id)))?;
        Ok(AuthToken {
            token: row.token,
            user_id: row.user_id,
            client_id,
            client_ip: row.client_ip,
            user_agent: row.user_agent,
            expires_at: row.expires_at,
        })
    }
}

/// Double-quote a SQL identifier, escaping embedded quotes.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("auth_tokens"), "\"auth_tokens\"");
        assert_eq!(quote_ident("evil\"name"), "\"evil\"\"name\"");
    }
}
