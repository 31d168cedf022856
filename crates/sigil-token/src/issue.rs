//! Credential issuance at login.

use crate::alloc::{self, TOKEN_COLUMN, TOKEN_LENGTH, TOKEN_TABLE};
use crate::error::TokenError;
use crate::record::{AuthToken, RequestContext};
use crate::sign::Signer;
use crate::store::TokenStore;
use chrono::{Duration, Utc};
use sigil_core::ClientId;
use std::sync::Arc;
use uuid::Uuid;

/// Full allocate-and-insert cycles attempted when an insert loses the
/// uniqueness race against a concurrent allocation.
const ISSUE_ATTEMPTS: usize = 3;

/// A freshly issued token record and the credential handed to the
/// client. The credential is returned once and never stored.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub record: AuthToken,
    pub credential: String,
}

/// Creates token records and their bearer credentials.
pub struct Issuer {
    store: Arc<dyn TokenStore>,
    signer: Signer,
    ttl: Duration,
}

impl Issuer {
    pub fn new(store: Arc<dyn TokenStore>, signer: Signer, ttl: Duration) -> Self {
        Self { store, signer, ttl }
    }

    /// Issue a credential for `user_id` logging in via `client_id`.
    ///
    /// Allocates a unique token, persists the record with the
    /// policy-defined TTL, and signs it against the login request's
    /// context. A duplicate-token insert is retried with a fresh
    /// allocation; every other failure is returned as-is.
    pub async fn issue(
        &self,
        user_id: Uuid,
        client_id: ClientId,
        ctx: &RequestContext,
    ) -> Result<IssuedCredential, TokenError> {
        for attempt in 1..=ISSUE_ATTEMPTS {
            let token =
                alloc::allocate(self.store.as_ref(), TOKEN_TABLE, TOKEN_COLUMN, TOKEN_LENGTH)
                    .await?;

            let record = AuthToken {
                token,
                user_id,
                client_id,
                client_ip: ctx.client_ip.clone(),
                user_agent: ctx.user_agent.clone(),
                expires_at: Utc::now() + self.ttl,
            };

            match self.store.insert_token(&record).await {
                Ok(()) => {
                    let credential = self.signer.credential(&record);
                    tracing::debug!(user_id = %user_id, client_id = %client_id, "issued token");
                    return Ok(IssuedCredential { record, credential });
                }
                Err(TokenError::DuplicateToken) => {
                    tracing::warn!(attempt, "token insert lost uniqueness race, reallocating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(TokenError::DuplicateToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::sign::CREDENTIAL_LENGTH;
    use crate::store::IdentifierStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> RequestContext {
        RequestContext::new(Some(ClientId::Web), "198.51.100.1", "tests")
    }

    #[tokio::test]
    async fn issues_a_full_length_credential() {
        let store = Arc::new(MemoryStore::new());
        let issuer = Issuer::new(store.clone(), Signer::new("secret"), Duration::hours(1));

        let issued = issuer.issue(Uuid::new_v4(), ClientId::Web, &ctx()).await.unwrap();
        assert_eq!(issued.credential.len(), CREDENTIAL_LENGTH);
        assert_eq!(&issued.credential[..TOKEN_LENGTH], issued.record.token);

        // the record landed in the store
        let found = store.find_token(&issued.record.token).await.unwrap();
        assert_eq!(found, issued.record);
    }

    #[tokio::test]
    async fn expiry_follows_the_configured_ttl() {
        let store = Arc::new(MemoryStore::new());
        let issuer = Issuer::new(store, Signer::new("secret"), Duration::hours(2));

        let before = Utc::now() + Duration::hours(2);
        let issued = issuer.issue(Uuid::new_v4(), ClientId::Api, &ctx()).await.unwrap();
        let after = Utc::now() + Duration::hours(2);

        assert!(issued.record.expires_at >= before);
        assert!(issued.record.expires_at <= after);
    }

    /// Store whose first inserts collide, as if a concurrent issuance
    /// had claimed the same value between probe and insert.
    struct RacyStore {
        inner: MemoryStore,
        collisions: AtomicUsize,
    }

    #[async_trait]
    impl IdentifierStore for RacyStore {
        async fn identifier_exists(
            &self,
            table: &str,
            column: &str,
            value: &str,
        ) -> Result<bool, TokenError> {
            self.inner.identifier_exists(table, column, value).await
        }
    }

    #[async_trait]
    impl TokenStore for RacyStore {
        async fn find_token(&self, token: &str) -> Result<AuthToken, TokenError> {
            self.inner.find_token(token).await
        }

        async fn insert_token(&self, record: &AuthToken) -> Result<(), TokenError> {
            if self.collisions.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n > 0).then(|| n - 1)
            }).is_ok()
            {
                return Err(TokenError::DuplicateToken);
            }
            self.inner.insert_token(record).await
        }

        async fn update_context(&self, record: &AuthToken) -> Result<(), TokenError> {
            self.inner.update_context(record).await
        }
    }

    #[tokio::test]
    async fn retries_past_a_lost_uniqueness_race() {
        let store = Arc::new(RacyStore {
            inner: MemoryStore::new(),
            collisions: AtomicUsize::new(2),
        });
        let issuer = Issuer::new(store, Signer::new("secret"), Duration::hours(1));

        let issued = issuer.issue(Uuid::new_v4(), ClientId::Web, &ctx()).await;
        assert!(issued.is_ok());
    }

    #[tokio::test]
    async fn gives_up_after_bounded_insert_attempts() {
        let store = Arc::new(RacyStore {
            inner: MemoryStore::new(),
            collisions: AtomicUsize::new(usize::MAX),
        });
        let issuer = Issuer::new(store, Signer::new("secret"), Duration::hours(1));

        let err = issuer
            .issue(Uuid::new_v4(), ClientId::Web, &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::DuplicateToken));
    }
}
