//! Store traits consumed by the allocator, issuer and gate.

use crate::error::TokenError;
use crate::record::AuthToken;
use async_trait::async_trait;

/// A probe into an identifier space (table/column pair).
///
/// Read-only: probing does not reserve the value, so an insert may
/// still hit a uniqueness violation if two allocations race.
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// Whether `value` already exists in `table.column`.
    async fn identifier_exists(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<bool, TokenError>;
}

/// Persistence operations on token records.
#[async_trait]
pub trait TokenStore: IdentifierStore {
    /// Resolve a record by its token value. Not-found and store
    /// failures both surface as [`TokenError::LookupFailed`].
    async fn find_token(&self, token: &str) -> Result<AuthToken, TokenError>;

    /// Persist a freshly issued record. A uniqueness violation on the
    /// token column surfaces as [`TokenError::DuplicateToken`].
    async fn insert_token(&self, record: &AuthToken) -> Result<(), TokenError>;

    /// Write back the record's refreshed context fields
    /// (client_id / client_ip / user_agent). Last write wins.
    async fn update_context(&self, record: &AuthToken) -> Result<(), TokenError>;
}
